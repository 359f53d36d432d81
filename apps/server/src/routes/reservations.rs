//! Reservation intake and the staff list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tavola_core::validation::validate_reservation;
use tavola_core::{NewReservation, ReservationStatus};
use tavola_db::ReservationFilter;

use super::{ApiJson, ApiQuery};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReservationQuery {
    pub status: Option<ReservationStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: ReservationStatus,
}

/// `POST /api/reservations` - stored as PENDING.
pub async fn create_reservation(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewReservation>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let valid = validate_reservation(&body, Utc::now().date_naive())?;
    let reservation = state.db.reservations().create(&valid).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "reservationId": reservation.id,
            "reservation": reservation,
        })),
    ))
}

/// `GET /api/reservations?status=&date=` - earliest first.
pub async fn list_reservations(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReservationQuery>,
) -> ApiResult<Json<Value>> {
    let reservations = state
        .db
        .reservations()
        .list(&ReservationFilter {
            status: query.status,
            date: query.date,
        })
        .await?;

    Ok(Json(json!({ "reservations": reservations })))
}

/// `PATCH /api/reservations/{id}`
pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusChange>,
) -> ApiResult<Json<Value>> {
    let reservation = state
        .db
        .reservations()
        .update_status(&id, body.status)
        .await?;

    Ok(Json(json!({ "reservation": reservation })))
}
