//! # Table Repository
//!
//! Dining tables and the ordering URL printed in each table's QR code.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tavola_core::validation::{validate_capacity, validate_table_number};
use tavola_core::{NewTable, Table, DEFAULT_TABLE_CAPACITY};

const TABLE_COLUMNS: &str = "id, number, capacity, active, ordering_url, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TableRow {
    id: String,
    number: String,
    capacity: i64,
    active: bool,
    ordering_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TableRow> for Table {
    fn from(row: TableRow) -> Self {
        Table {
            id: row.id,
            number: row.number,
            capacity: row.capacity,
            active: row.active,
            ordering_url: row.ordering_url,
            created_at: row.created_at,
        }
    }
}

/// Repository for table database operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Lists tables, numeric numbers first in numeric order.
    pub async fn list(&self) -> DbResult<Vec<Table>> {
        let rows: Vec<TableRow> = sqlx::query_as(&format!(
            r#"
            SELECT {TABLE_COLUMNS} FROM dining_tables
            ORDER BY CAST(number AS INTEGER) = 0, CAST(number AS INTEGER), number
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Table::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Table>> {
        let row: Option<TableRow> = sqlx::query_as(&format!(
            "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Table::from))
    }

    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Table>> {
        let row: Option<TableRow> = sqlx::query_as(&format!(
            "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE number = ?1"
        ))
        .bind(number.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Table::from))
    }

    /// Creates a table and derives its ordering URL from `app_url`.
    ///
    /// ## Errors
    /// - [`DbError::Rule`] for a malformed number or capacity
    /// - [`DbError::UniqueViolation`] when the number is taken
    pub async fn create(&self, new: &NewTable, app_url: &str) -> DbResult<Table> {
        let number = new.number.trim();
        validate_table_number(number)?;
        let capacity = new.capacity.unwrap_or(DEFAULT_TABLE_CAPACITY);
        validate_capacity(capacity)?;

        let id = Uuid::new_v4().to_string();
        let table = Table {
            ordering_url: Some(Table::ordering_url_for(app_url, &id)),
            id,
            number: number.to_string(),
            capacity,
            active: true,
            created_at: Utc::now(),
        };

        match self.insert(&table).await {
            Ok(()) => {
                info!(number = %table.number, capacity = table.capacity, "Table created");
                Ok(table)
            }
            Err(err) if err.is_unique_violation_on("dining_tables.number") => {
                Err(DbError::duplicate("number", number))
            }
            Err(err) => Err(err),
        }
    }

    /// Inserts a table as given.
    pub async fn insert(&self, table: &Table) -> DbResult<()> {
        debug!(id = %table.id, number = %table.number, "Inserting table");

        sqlx::query(
            r#"
            INSERT INTO dining_tables (id, number, capacity, active, ordering_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&table.id)
        .bind(&table.number)
        .bind(table.capacity)
        .bind(table.active)
        .bind(&table.ordering_url)
        .bind(table.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dining_tables")
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
    use crate::{Database, DbConfig};
    use tavola_core::CoreError;

    const APP_URL: &str = "https://tavola.example";

    fn new_table(number: &str, capacity: Option<i64>) -> NewTable {
        NewTable {
            number: number.to_string(),
            capacity,
        }
    }

    #[tokio::test]
    async fn test_create_table() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let table = db
            .tables()
            .create(&new_table(" 12 ", None), APP_URL)
            .await
            .unwrap();

        assert_eq!(table.number, "12");
        assert_eq!(table.capacity, DEFAULT_TABLE_CAPACITY);
        assert_eq!(
            table.ordering_url.as_deref(),
            Some(format!("{}/qr-menu/{}", APP_URL, table.id).as_str())
        );

        let stored = db.tables().get_by_number("12").await.unwrap().unwrap();
        assert_eq!(stored.id, table.id);
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.tables().create(&new_table("5", None), APP_URL).await.unwrap();

        let err = db
            .tables()
            .create(&new_table("5", Some(2)), APP_URL)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "number"));
        assert_eq!(db.tables().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for bad in [new_table("", None), new_table("7 b", None), new_table("8", Some(0))] {
            let err = db.tables().create(&bad, APP_URL).await.unwrap_err();
            assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_list_in_numeric_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for n in ["10", "2", "Garden-1", "1"] {
            db.tables().create(&new_table(n, None), APP_URL).await.unwrap();
        }

        let numbers: Vec<String> = db
            .tables()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.number)
            .collect();
        assert_eq!(numbers, vec!["1", "2", "10", "Garden-1"]);
    }
}
