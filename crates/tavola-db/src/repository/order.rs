//! # Order Repository
//!
//! Persistence for submitted orders and their staff-driven lifecycle.
//!
//! ## Order Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderSubmission                                                        │
//! │       │                                                                 │
//! │       ├── idempotency key seen before? ──► same cart: replay stored    │
//! │       │                                    different cart: reject      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load catalog slice ──► submission.price(&catalog) ──► PricedOrder      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    order_counters upsert ──► ORD-YYYYMMDD-NNNN                          │
//! │    INSERT orders                                                        │
//! │    INSERT order_items (one per line, in submission order)               │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       └── UNIQUE(idempotency_key) lost a race? ──► replay the winner    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::menu::MenuRepository;
use tavola_core::{
    Customizations, LifecycleState, Order, OrderItem, OrderNumber, OrderStatus, OrderSubmission,
    OrderUpdate, PaymentStatus, PricedOrder,
};

const ORDER_COLUMNS: &str = r#"
    id, order_number, table_id, status, payment_status,
    subtotal_cents, tax_cents, tip_cents, total_cents,
    idempotency_key, created_at, updated_at, completed_at
"#;

// =============================================================================
// Public Types
// =============================================================================

/// Result of [`OrderRepository::create`].
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    /// True when the idempotency key matched an order created earlier.
    pub replayed: bool,
}

/// Filters for the staff order list. `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub table_id: Option<String>,
    pub order_number: Option<OrderNumber>,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    table_id: Option<String>,
    status: OrderStatus,
    payment_status: PaymentStatus,
    subtotal_cents: i64,
    tax_cents: i64,
    tip_cents: i64,
    total_cents: i64,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            table_id: self.table_id,
            status: self.status,
            payment_status: self.payment_status,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            tip_cents: self.tip_cents,
            total_cents: self.total_cents,
            items,
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    menu_item_id: String,
    name: String,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
    customizations: Option<String>,
    special_notes: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DbError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let customizations: Customizations = match row.customizations.as_deref() {
            Some(json) => serde_json::from_str(json)?,
            None => Customizations::new(),
        };
        Ok(OrderItem {
            id: row.id,
            order_id: row.order_id,
            menu_item_id: row.menu_item_id,
            name: row.name,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            line_total_cents: row.line_total_cents,
            customizations,
            special_notes: row.special_notes,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order from a client submission.
    ///
    /// The submission is repriced against the current catalog; any
    /// disagreement is rejected with [`DbError::Rule`]. Retrying the same
    /// submission with the same idempotency key returns the stored order
    /// with `replayed = true` and never creates a second one. Reusing a key
    /// for a different table, lines or totals is
    /// [`DbError::IdempotencyKeyReused`].
    pub async fn create(&self, submission: &OrderSubmission) -> DbResult<CreatedOrder> {
        if let Some(key) = submission.idempotency_key.as_deref() {
            if let Some(order) = self.get_by_idempotency_key(key).await? {
                return Self::replay(submission, key, order);
            }
        }

        let catalog = MenuRepository::new(self.pool.clone())
            .items_by_ids(&submission.menu_item_ids())
            .await?;
        let priced = submission.price(&catalog)?;

        if let Some(table_id) = priced.table_id.as_deref() {
            self.ensure_table_exists(table_id).await?;
        }

        match self.insert_priced(&priced).await {
            Ok(order) => Ok(CreatedOrder {
                order,
                replayed: false,
            }),
            Err(err) if err.is_unique_violation_on("orders.idempotency_key") => {
                let key = priced.idempotency_key.as_deref().unwrap_or_default();
                warn!(idempotency_key = %key, "Concurrent submission with same key");
                match self.get_by_idempotency_key(key).await? {
                    Some(order) => Self::replay(submission, key, order),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the stored order for a retried submission.
    fn replay(submission: &OrderSubmission, key: &str, order: Order) -> DbResult<CreatedOrder> {
        if !submission.matches_order(&order) {
            warn!(
                idempotency_key = %key,
                order_number = %order.order_number,
                "Idempotency key reused for a different order"
            );
            return Err(DbError::IdempotencyKeyReused {
                key: key.to_string(),
            });
        }

        debug!(order_number = %order.order_number, "Idempotent replay");
        Ok(CreatedOrder {
            order,
            replayed: true,
        })
    }

    async fn ensure_table_exists(&self, table_id: &str) -> DbResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM dining_tables WHERE id = ?1")
            .bind(table_id)
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Ok(()),
            None => Err(DbError::not_found("Table", table_id)),
        }
    }

    /// Writes a priced order, its items and its order number atomically.
    async fn insert_priced(&self, priced: &PricedOrder) -> DbResult<Order> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let today = now.date_naive();

        let mut tx = self.pool.begin().await?;

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_counters (day, last_seq) VALUES (?1, 1)
            ON CONFLICT(day) DO UPDATE SET last_seq = last_seq + 1
            RETURNING last_seq
            "#,
        )
        .bind(OrderNumber::day_key(today))
        .fetch_one(&mut *tx)
        .await?;

        let sequence = u32::try_from(sequence)
            .map_err(|_| DbError::Internal(format!("order sequence out of range: {}", sequence)))?;
        let order_number = OrderNumber::new(today, sequence).to_string();

        debug!(id = %id, order_number = %order_number, "Creating order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, table_id, status, payment_status,
                subtotal_cents, tax_cents, tip_cents, total_cents,
                idempotency_key, created_at, updated_at, completed_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?11, NULL
            )
            "#,
        )
        .bind(&id)
        .bind(&order_number)
        .bind(&priced.table_id)
        .bind(OrderStatus::Pending)
        .bind(priced.payment_status)
        .bind(priced.totals.subtotal_cents)
        .bind(priced.totals.tax_cents)
        .bind(priced.totals.tip_cents)
        .bind(priced.totals.total_cents)
        .bind(&priced.idempotency_key)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for (position, line) in priced.lines.iter().enumerate() {
            let item = OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: id.clone(),
                menu_item_id: line.menu_item_id.clone(),
                name: line.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total_cents,
                customizations: line.customizations.clone(),
                special_notes: line.special_notes.clone(),
            };
            let customizations = if item.customizations.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&item.customizations)?)
            };

            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, position, menu_item_id, name, quantity,
                    unit_price_cents, line_total_cents, customizations, special_notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(position as i64)
            .bind(&item.menu_item_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.line_total_cents)
            .bind(customizations)
            .bind(&item.special_notes)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        tx.commit().await?;

        info!(
            order_number = %order_number,
            table_id = ?priced.table_id,
            total_cents = priced.totals.total_cents,
            "Order created"
        );

        Ok(Order {
            id,
            order_number,
            table_id: priced.table_id.clone(),
            status: OrderStatus::Pending,
            payment_status: priced.payment_status,
            subtotal_cents: priced.totals.subtotal_cents,
            tax_cents: priced.totals.tax_cents,
            tip_cents: priced.totals.tip_cents,
            total_cents: priced.totals.total_cents,
            items,
            idempotency_key: priced.idempotency_key.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Gets an order with its items by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        self.fetch_one_where("id", id).await
    }

    pub async fn get_by_idempotency_key(&self, key: &str) -> DbResult<Option<Order>> {
        self.fetch_one_where("idempotency_key", key).await
    }

    async fn fetch_one_where(&self, column: &'static str, value: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {column} = ?1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.items_for(&[row.id.clone()]).await?;
        let lines = items.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(lines)))
    }

    /// Lists orders newest first, with their items.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR table_id = ?2)
              AND (?3 IS NULL OR order_number = ?3)
            ORDER BY created_at DESC, order_number DESC
            "#
        ))
        .bind(filter.status)
        .bind(&filter.table_id)
        .bind(filter.order_number.map(|n| n.to_string()))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect())
    }

    /// Loads items for the given orders, grouped by order id, in line order.
    async fn items_for(&self, order_ids: &[String]) -> DbResult<HashMap<String, Vec<OrderItem>>> {
        let mut grouped: HashMap<String, Vec<OrderItem>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, order_id, menu_item_id, name, quantity, unit_price_cents, \
             line_total_cents, customizations, special_notes \
             FROM order_items WHERE order_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in order_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY order_id, position");

        let rows: Vec<OrderItemRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        for row in rows {
            let item = OrderItem::try_from(row)?;
            grouped.entry(item.order_id.clone()).or_default().push(item);
        }

        Ok(grouped)
    }

    /// Applies a staff status/payment update.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] when the order doesn't exist
    /// - [`DbError::Rule`] when the transition table forbids the change
    /// - [`DbError::Conflict`] when someone else changed the order first
    pub async fn update_lifecycle(&self, id: &str, update: OrderUpdate) -> DbResult<Order> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        let state = LifecycleState {
            status: current.status,
            payment_status: current.payment_status,
            completed_at: current.completed_at,
        };
        let next = state.apply(update, Utc::now())?;

        if next == state {
            return Ok(current);
        }

        self.write_lifecycle(id, state, next).await?;

        info!(
            order_number = %current.order_number,
            from = %state.status,
            to = %next.status,
            payment_status = %next.payment_status,
            "Order updated"
        );

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Marks an order paid. Already-paid orders are left as they are.
    pub async fn mark_paid(&self, id: &str) -> DbResult<Order> {
        self.update_lifecycle(
            id,
            OrderUpdate {
                status: None,
                payment_status: Some(PaymentStatus::Paid),
            },
        )
        .await
    }

    /// Writes `to` only if the stored row still matches `from`.
    async fn write_lifecycle(
        &self,
        id: &str,
        from: LifecycleState,
        to: LifecycleState,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?4,
                payment_status = ?5,
                completed_at = ?6,
                updated_at = ?7
            WHERE id = ?1 AND status = ?2 AND payment_status = ?3
            "#,
        )
        .bind(id)
        .bind(from.status)
        .bind(from.payment_status)
        .bind(to.status)
        .bind(to.payment_status)
        .bind(to.completed_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Order", id));
        }

        Ok(())
    }

    /// Number of orders, for the health endpoint.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::seeded_db;
    use crate::Database;
    use tavola_core::{CoreError, NewTable, SubmittedLine};

    fn line(id: &str, quantity: i64, unit_price_cents: i64) -> SubmittedLine {
        SubmittedLine {
            menu_item_id: id.to_string(),
            quantity,
            unit_price_cents,
            customizations: Customizations::new(),
            special_notes: None,
        }
    }

    /// Nachos + 2× wings: 2650 + 583 VAT = 3233.
    fn submission(table_id: Option<String>, key: Option<&str>) -> OrderSubmission {
        OrderSubmission {
            table_id,
            items: vec![line("nachos", 1, 850), line("wings", 2, 900)],
            subtotal_cents: 2650,
            tax_cents: 583,
            tip_cents: 0,
            total_cents: 3233,
            payment_status: None,
            idempotency_key: key.map(str::to_string),
        }
    }

    async fn with_table() -> (Database, String) {
        let db = seeded_db().await;
        let table = db
            .tables()
            .create(
                &NewTable {
                    number: "7".to_string(),
                    capacity: None,
                },
                "http://localhost:3000",
            )
            .await
            .unwrap();
        (db, table.id)
    }

    #[tokio::test]
    async fn test_create_order() {
        let (db, table_id) = with_table().await;
        let created = db
            .orders()
            .create(&submission(Some(table_id.clone()), None))
            .await
            .unwrap();

        assert!(!created.replayed);
        let order = created.order;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.total_cents, 3233);
        assert_eq!(order.table_id.as_deref(), Some(table_id.as_str()));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].menu_item_id, "nachos");
        assert_eq!(order.items[1].line_total_cents, 1800);

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.order_number, order.order_number);
        assert_eq!(stored.items, order.items);
    }

    #[tokio::test]
    async fn test_order_numbers_are_sequential() {
        let db = seeded_db().await;
        let first = db.orders().create(&submission(None, None)).await.unwrap();
        let second = db.orders().create(&submission(None, None)).await.unwrap();

        let a: OrderNumber = first.order.order_number.parse().unwrap();
        let b: OrderNumber = second.order.order_number.parse().unwrap();
        assert_eq!(a.date(), b.date());
        assert_eq!(a.sequence(), 1);
        assert_eq!(b.sequence(), 2);
    }

    #[tokio::test]
    async fn test_idempotent_replay() {
        let db = seeded_db().await;
        let first = db
            .orders()
            .create(&submission(None, Some("cart-42")))
            .await
            .unwrap();
        let again = db
            .orders()
            .create(&submission(None, Some("cart-42")))
            .await
            .unwrap();

        assert!(again.replayed);
        assert_eq!(again.order.id, first.order.id);
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_key_reused_for_different_cart_is_rejected() {
        let (db, table_id) = with_table().await;
        db.orders()
            .create(&submission(None, Some("cart-42")))
            .await
            .unwrap();

        let mut one_wing = submission(None, Some("cart-42"));
        one_wing.items[1].quantity = 1;
        one_wing.subtotal_cents = 1750;
        one_wing.tax_cents = 385;
        one_wing.total_cents = 2135;
        let err = db.orders().create(&one_wing).await.unwrap_err();
        assert!(matches!(err, DbError::IdempotencyKeyReused { ref key } if key == "cart-42"));

        let other_table = submission(Some(table_id), Some("cart-42"));
        assert!(matches!(
            db.orders().create(&other_table).await,
            Err(DbError::IdempotencyKeyReused { .. })
        ));

        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_price_tampering_is_rejected() {
        let db = seeded_db().await;
        let mut s = submission(None, None);
        s.items[0].unit_price_cents = 1;

        let err = db.orders().create(&s).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::PriceMismatch { .. })
        ));
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_item_is_rejected() {
        let db = seeded_db().await;
        let mut s = submission(None, None);
        s.items = vec![line("special", 1, 1500)];
        s.subtotal_cents = 1500;
        s.tax_cents = 330;
        s.total_cents = 1830;

        let err = db.orders().create(&s).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::MenuItemUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let db = seeded_db().await;
        let err = db
            .orders()
            .create(&submission(Some("no-such-table".to_string()), None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_customizations_are_stored() {
        let db = seeded_db().await;
        let mut s = submission(None, None);
        s.items[0]
            .customizations
            .insert("spice".to_string(), serde_json::json!("hot"));
        s.items[0].special_notes = Some("no onions".to_string());

        let order = db.orders().create(&s).await.unwrap().order;
        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].customizations["spice"], "hot");
        assert_eq!(stored.items[0].special_notes.as_deref(), Some("no onions"));
        assert!(stored.items[1].customizations.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let (db, table_id) = with_table().await;
        let first = db
            .orders()
            .create(&submission(Some(table_id.clone()), None))
            .await
            .unwrap()
            .order;
        let second = db.orders().create(&submission(None, None)).await.unwrap().order;
        db.orders()
            .update_lifecycle(
                &second.id,
                OrderUpdate {
                    status: Some(OrderStatus::Confirmed),
                    payment_status: None,
                },
            )
            .await
            .unwrap();

        let all = db.orders().list(&OrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[0].items.len(), 2);

        let pending = db
            .orders()
            .list(&OrderFilter {
                status: Some(OrderStatus::Pending),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, first.id);

        let at_table = db
            .orders()
            .list(&OrderFilter {
                table_id: Some(table_id),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(at_table.len(), 1);
        assert_eq!(at_table[0].id, first.id);

        let number: OrderNumber = second.order_number.parse().unwrap();
        let by_number = db
            .orders()
            .list(&OrderFilter {
                order_number: Some(number),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].id, second.id);
    }

    #[tokio::test]
    async fn test_lifecycle_walk_to_completion() {
        let db = seeded_db().await;
        let order = db.orders().create(&submission(None, None)).await.unwrap().order;

        let mut current = order;
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Completed,
        ] {
            current = db
                .orders()
                .update_lifecycle(
                    &current.id,
                    OrderUpdate {
                        status: Some(status),
                        payment_status: None,
                    },
                )
                .await
                .unwrap();
            assert_eq!(current.status, status);
        }
        assert!(current.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let db = seeded_db().await;
        let order = db.orders().create(&submission(None, None)).await.unwrap().order;

        let err = db
            .orders()
            .update_lifecycle(
                &order.id,
                OrderUpdate {
                    status: Some(OrderStatus::Delivered),
                    payment_status: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InvalidTransition { .. })
        ));

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_stale_write_is_a_conflict() {
        let db = seeded_db().await;
        let order = db.orders().create(&submission(None, None)).await.unwrap().order;
        let repo = db.orders();

        let pending = LifecycleState {
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            completed_at: None,
        };
        let confirmed = LifecycleState {
            status: OrderStatus::Confirmed,
            ..pending
        };
        let cancelled = LifecycleState {
            status: OrderStatus::Cancelled,
            ..pending
        };

        repo.write_lifecycle(&order.id, pending, confirmed).await.unwrap();
        let err = repo
            .write_lifecycle(&order.id, pending, cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent() {
        let db = seeded_db().await;
        let order = db.orders().create(&submission(None, None)).await.unwrap().order;

        let paid = db.orders().mark_paid(&order.id).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.status, OrderStatus::Pending);

        let again = db.orders().mark_paid(&order.id).await.unwrap();
        assert_eq!(again.payment_status, PaymentStatus::Paid);

        assert!(matches!(
            db.orders().mark_paid("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
