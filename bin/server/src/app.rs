//! Router assembly.

use axum::{
    Json, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api;
use crate::auth::{self, AppState, require_bearer};

/// Builds the application router.
///
/// `/login`, `/auth/callback` and `/healthz` are public; every other route
/// requires a bearer ID token.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/customers", post(api::create_customer))
        .route("/customers/{id}", get(api::get_customer))
        .route("/orders", post(api::create_order))
        .route("/orders/{id}", get(api::get_order))
        .route("/items/{id}", get(api::get_item))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/healthz", get(healthz))
        .merge(protected)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([AUTHORIZATION])
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
