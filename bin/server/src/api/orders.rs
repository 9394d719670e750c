//! Order endpoints.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use savannah_core::{ItemId, OrderId};
use savannah_store::{NewOrder, Order};
use serde::Deserialize;
use std::sync::Arc;

use super::parse_id;
use crate::auth::{AppState, VerifiedCaller};
use crate::error::ApiError;
use crate::notify::order_confirmation;

/// Body of `POST /orders`.
///
/// The owner and timestamp are not accepted from the client; a `user_id` or
/// `placed_at` in the body is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub item_id: ItemId,
    pub qty: i32,
    pub contact: String,
}

impl CreateOrder {
    fn validate(&self) -> Result<(), ApiError> {
        if self.qty <= 0 {
            return Err(ApiError::Validation("qty must be positive".to_string()));
        }
        if self.contact.trim().is_empty() {
            return Err(ApiError::Validation("contact must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Places an order for the verified caller and sends a confirmation SMS.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    VerifiedCaller(caller): VerifiedCaller,
    body: Result<Json<CreateOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(body) = body?;
    body.validate()?;

    let user = state.repo.find_user_by_email(&caller.email).await?;
    let item = state.repo.find_item(body.item_id).await?;

    let order = state
        .repo
        .create_order(NewOrder {
            user_id: user.id,
            item_id: item.id,
            quantity: body.qty,
            placed_at: Utc::now(),
            contact: body.contact.trim().to_string(),
        })
        .await?;
    tracing::info!(order_id = %order.id, user_id = %user.id, item_id = %item.id, "Order created");

    // The order is already stored; a failed SMS does not undo it.
    let message = order_confirmation(&item, order.quantity);
    if let Err(e) = state.notifier.send(&order.contact, &message).await {
        tracing::warn!(order_id = %order.id, error = %e, "Failed to send order confirmation");
    }

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    _caller: VerifiedCaller,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    Ok(Json(state.repo.find_order(id).await?))
}
