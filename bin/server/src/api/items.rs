//! Catalog item endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use savannah_core::ItemId;
use savannah_store::Item;
use std::sync::Arc;

use super::parse_id;
use crate::auth::{AppState, VerifiedCaller};
use crate::error::ApiError;

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    _caller: VerifiedCaller,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let id: ItemId = parse_id(&id)?;
    Ok(Json(state.repo.find_item(id).await?))
}
