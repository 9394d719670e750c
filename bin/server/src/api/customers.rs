//! Customer endpoints.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use savannah_core::UserId;
use savannah_store::{NewUser, User};
use serde::Deserialize;
use std::sync::Arc;

use super::parse_id;
use crate::auth::{AppState, VerifiedCaller};
use crate::error::ApiError;

/// Body of `POST /customers`.
#[derive(Debug, Deserialize)]
pub struct CreateCustomer {
    pub code: String,
    pub email: String,
}

impl CreateCustomer {
    fn validate(self) -> Result<NewUser, ApiError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::Validation("email is not valid".to_string()));
        }
        if self.code.trim().is_empty() {
            return Err(ApiError::Validation("code must not be empty".to_string()));
        }
        Ok(NewUser::new(self.code.trim(), email))
    }
}

pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    VerifiedCaller(caller): VerifiedCaller,
    body: Result<Json<CreateCustomer>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(body) = body?;
    let new_user = body.validate()?;

    let user = state.repo.create_user(new_user).await?;
    tracing::info!(user_id = %user.id, created_by = %caller.subject, "Customer created");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    _caller: VerifiedCaller,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let user = state.repo.find_user(id).await?;
    Ok(Json(user))
}
