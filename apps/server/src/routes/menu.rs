//! Menu read endpoints for the QR menu.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/menu` - categories in display order with their available items.
pub async fn list_menu(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let sections = state.db.menu().sections().await?;
    debug!(sections = sections.len(), "list_menu");
    Ok(Json(json!({ "sections": sections })))
}

/// `GET /api/menu/items/{id}`
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let item = state
        .db
        .menu()
        .get_item(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Menu item", &id))?;

    Ok(Json(json!({ "item": item })))
}
