//! # Menu Repository
//!
//! Categories and menu items. The catalog is also the price authority that
//! order submissions are checked against.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tavola_core::validation::validate_price_cents;
use tavola_core::{Allergen, Category, MenuItem, MenuSection};

const ITEM_COLUMNS: &str = "id, category_id, name, name_it, description, description_it, \
     price_cents, allergens, available, featured, abv, origin, style";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    slug: String,
    name: String,
    name_it: String,
    display_order: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            slug: row.slug,
            name: row.name,
            name_it: row.name_it,
            display_order: row.display_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: String,
    category_id: String,
    name: String,
    name_it: String,
    description: Option<String>,
    description_it: Option<String>,
    price_cents: i64,
    allergens: String,
    available: bool,
    featured: bool,
    abv: Option<f64>,
    origin: Option<String>,
    style: Option<String>,
}

impl TryFrom<MenuItemRow> for MenuItem {
    type Error = DbError;

    fn try_from(row: MenuItemRow) -> Result<Self, Self::Error> {
        let allergens: Vec<Allergen> = serde_json::from_str(&row.allergens)?;
        Ok(MenuItem {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            name_it: row.name_it,
            description: row.description,
            description_it: row.description_it,
            price_cents: row.price_cents,
            allergens,
            available: row.available,
            featured: row.featured,
            abv: row.abv,
            origin: row.origin,
            style: row.style,
        })
    }
}

fn into_items(rows: Vec<MenuItemRow>) -> DbResult<Vec<MenuItem>> {
    rows.into_iter().map(MenuItem::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for menu database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// All categories in display order.
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, slug, name, name_it, display_order FROM categories \
             ORDER BY display_order, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// All menu items, available or not, grouped by category order.
    pub async fn list_items(&self) -> DbResult<Vec<MenuItem>> {
        let rows: Vec<MenuItemRow> = sqlx::query_as(&format!(
            "SELECT {cols} FROM menu_items m \
             JOIN categories c ON c.id = m.category_id \
             ORDER BY c.display_order, m.name",
            cols = prefixed_item_columns("m")
        ))
        .fetch_all(&self.pool)
        .await?;

        into_items(rows)
    }

    /// The guest-facing menu: categories with their available items.
    /// Categories with nothing available are left out.
    pub async fn sections(&self) -> DbResult<Vec<MenuSection>> {
        let categories = self.list_categories().await?;
        let mut by_category: HashMap<String, Vec<MenuItem>> = HashMap::new();
        for item in self.list_items().await? {
            if item.available {
                by_category
                    .entry(item.category_id.clone())
                    .or_default()
                    .push(item);
            }
        }

        Ok(categories
            .into_iter()
            .filter_map(|category| {
                by_category
                    .remove(&category.id)
                    .map(|items| MenuSection { category, items })
            })
            .collect())
    }

    /// Gets a menu item by ID.
    pub async fn get_item(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let row: Option<MenuItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MenuItem::try_from).transpose()
    }

    /// Loads the given menu items keyed by id. Unknown ids are simply absent.
    pub async fn items_by_ids(&self, ids: &[String]) -> DbResult<HashMap<String, MenuItem>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items WHERE id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<MenuItemRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!(requested = ids.len(), found = rows.len(), "Loaded catalog slice");

        into_items(rows).map(|items| {
            items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect()
        })
    }

    /// Inserts a category.
    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO categories (id, slug, name, name_it, display_order) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&category.id)
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.name_it)
        .bind(category.display_order)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a menu item.
    pub async fn insert_item(&self, item: &MenuItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting menu item");
        validate_price_cents(item.price_cents)?;
        let now = Utc::now();
        let allergens = serde_json::to_string(&item.allergens)?;

        sqlx::query(
            "INSERT INTO menu_items ( \
                 id, category_id, name, name_it, description, description_it, \
                 price_cents, allergens, available, featured, abv, origin, style, \
                 created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
        )
        .bind(&item.id)
        .bind(&item.category_id)
        .bind(&item.name)
        .bind(&item.name_it)
        .bind(&item.description)
        .bind(&item.description_it)
        .bind(item.price_cents)
        .bind(allergens)
        .bind(item.available)
        .bind(item.featured)
        .bind(item.abv)
        .bind(&item.origin)
        .bind(&item.style)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Switches a menu item on or off (sold out).
    pub async fn set_available(&self, id: &str, available: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE menu_items SET available = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(available)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MenuItem", id));
        }

        Ok(())
    }

    /// Number of menu items.
    pub async fn count_items(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn prefixed_item_columns(alias: &str) -> String {
    ITEM_COLUMNS
        .split(", ")
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Unit Tests
// =============================================================================
