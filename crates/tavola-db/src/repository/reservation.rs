//! # Reservation Repository

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tavola_core::{Reservation, ReservationStatus, ValidReservation};

const RESERVATION_COLUMNS: &str = r#"
    id, name, email, phone, date, time, guests, special_requests,
    status, created_at, updated_at
"#;

/// Filters for the reservation list. `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    date: NaiveDate,
    time: String,
    guests: i64,
    special_requests: Option<String>,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            date: row.date,
            time: row.time,
            guests: row.guests,
            special_requests: row.special_requests,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for reservation database operations.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    /// Stores a validated reservation request as `PENDING`.
    pub async fn create(&self, valid: &ValidReservation) -> DbResult<Reservation> {
        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            name: valid.name.clone(),
            email: valid.email.clone(),
            phone: valid.phone.clone(),
            date: valid.date,
            time: valid.time.clone(),
            guests: valid.guests,
            special_requests: valid.special_requests.clone(),
            status: ReservationStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO reservations (
                id, name, email, phone, date, time, guests, special_requests,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
        )
        .bind(&reservation.id)
        .bind(&reservation.name)
        .bind(&reservation.email)
        .bind(&reservation.phone)
        .bind(reservation.date)
        .bind(&reservation.time)
        .bind(reservation.guests)
        .bind(&reservation.special_requests)
        .bind(reservation.status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(
            date = %reservation.date,
            time = %reservation.time,
            guests = reservation.guests,
            "Reservation received"
        );

        Ok(reservation)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Reservation::from))
    }

    /// Lists reservations by date then time, earliest first.
    pub async fn list(&self, filter: &ReservationFilter) -> DbResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR date = ?2)
            ORDER BY date, time, created_at
            "#
        ))
        .bind(filter.status)
        .bind(filter.date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    /// Sets a reservation's status.
    pub async fn update_status(&self, id: &str, status: ReservationStatus) -> DbResult<Reservation> {
        let result = sqlx::query(
            "UPDATE reservations SET status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reservation", id));
        }

        info!(id = %id, status = %status.as_str(), "Reservation status changed");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Reservation", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
