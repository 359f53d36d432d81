//! # Table Endpoints
//!
//! Each table's QR code encodes `{appUrl}/qr-menu/{tableId}`. The server
//! hands out the URL; rendering it as an image is the admin panel's job.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tavola_core::{NewTable, Table};

use super::ApiJson;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLink {
    pub table_id: String,
    pub number: String,
    pub ordering_url: String,
}

/// `GET /api/tables` - by number.
pub async fn list_tables(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let tables = state.db.tables().list().await?;
    Ok(Json(json!({ "tables": tables })))
}

/// `POST /api/tables`
///
/// 409 when the number is already taken.
pub async fn create_table(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewTable>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let table = state
        .db
        .tables()
        .create(&body, state.config.app_url())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "table": table }))))
}

/// `GET /api/tables/{id}/link`
///
/// Built from the current app URL, so links stay right after a domain move.
pub async fn table_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TableLink>> {
    let table = state
        .db
        .tables()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Table", &id))?;

    Ok(Json(TableLink {
        ordering_url: Table::ordering_url_for(state.config.app_url(), &table.id),
        table_id: table.id,
        number: table.number,
    }))
}
