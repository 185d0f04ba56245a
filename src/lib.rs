//! Saria Beauty storefront API
//!
//! Orders, Stripe and PayPal payments, live event streams, the shopping
//! assistant and the storefront content behind one axum router.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::FromRef, routing::get, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::events::EventBus;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub events: Arc<dyn EventBus>,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Everything mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", handlers::orders::order_routes())
        .nest("/payment", handlers::payments::payment_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/contact", handlers::contact::contact_routes())
        .nest("/newsletter", handlers::contact::newsletter_routes())
        .nest("/pages", handlers::pages::page_routes())
        .nest("/users", handlers::users::user_routes())
        .nest("/admin", handlers::admin::admin_routes())
        .nest("/chat", handlers::chat::chat_routes())
}

/// Full application router: API, health, static assets and Swagger UI.
///
/// Every request gets an `x-request-id` and a trace span. CORS and
/// compression are left to the binary.
pub fn app_router(state: AppState) -> Router {
    let images = ServeDir::new(&state.config.images_dir);
    let uploads = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        .route("/", get(|| async { "saria-api up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api", api_routes())
        .nest_service("/images", images)
        .nest_service("/uploads", uploads)
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            crate::tracing::request_id_middleware,
        ))
        .with_state(state)
}
