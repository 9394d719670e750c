//! Authentication routes for login and callback.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use openidconnect::{CsrfToken, Nonce};
use savannah_store::{NewUser, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::AppState;
use crate::config::CookieConfig;
use crate::error::ApiError;

/// CSRF state cookie name.
pub const STATE_COOKIE: &str = "state";

/// Replay-protection nonce cookie name.
pub const NONCE_COOKIE: &str = "nonce";

/// Random bytes behind each state and nonce value.
const TOKEN_BYTES: u32 = 16;

/// Query parameters for the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    state: Option<String>,
    code: Option<String>,
}

/// Body returned by a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The provider's signed ID token, to be sent back as a bearer token.
    pub access_token: String,
    pub user: User,
}

fn login_cookie(config: &CookieConfig, name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(config.max_age_seconds))
        .build()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Reads a login cookie, treating an empty value as absent.
fn login_cookie_value(jar: &CookieJar, name: &'static str) -> Result<String, ApiError> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Csrf(format!("{name} cookie not found")))
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let csrf_state = CsrfToken::new_random_len(TOKEN_BYTES).secret().clone();
    let nonce = Nonce::new_random_len(TOKEN_BYTES).secret().clone();

    let auth_url = state.provider.authorization_url(&csrf_state, &nonce);

    let jar = jar
        .add(login_cookie(&state.cookies, STATE_COOKIE, csrf_state))
        .add(login_cookie(&state.cookies, NONCE_COOKIE, nonce));

    (StatusCode::FOUND, jar, [(header::LOCATION, auth_url)])
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    // Validate CSRF state before talking to the provider
    let expected_state = login_cookie_value(&jar, STATE_COOKIE)?;

    if query.state.as_deref() != Some(expected_state.as_str()) {
        return Err(ApiError::Csrf("state parameter does not match cookie".to_string()));
    }

    let nonce = login_cookie_value(&jar, NONCE_COOKIE)?;

    let code = query
        .code
        .ok_or_else(|| ApiError::Validation("missing code parameter".to_string()))?;

    // Exchange the authorization code for tokens
    let tokens = state.provider.exchange_code(&code).await?;

    let user_info = state.provider.user_info(&tokens.access_token).await?;
    let email = user_info.require_email()?;

    // Find or create user
    let (user, created) = state
        .repo
        .find_or_create_user(NewUser::new(user_info.subject.clone(), email))
        .await?;
    if created {
        tracing::info!(user_id = %user.id, "Provisioned user on first login");
    }

    // The ID token must be genuine and belong to this login attempt
    state.provider.verify_id_token(&tokens.id_token, Some(&nonce))?;

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = jar
        .add(expired_cookie(STATE_COOKIE))
        .add(expired_cookie(NONCE_COOKIE));

    Ok((
        jar,
        Json(LoginResponse {
            access_token: tokens.id_token,
            user,
        }),
    ))
}
