//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the JSON API under `/api`, the auth callback, the
//! server-rendered page shells, and the mobile shell config. The dashboard
//! and the sign-in pages sit behind session gates applied as route layers.

pub mod ai;
pub mod auth;
pub mod error;
pub mod pages;
pub mod stripe;
pub mod usage;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Json;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::mobile::ShellConfig;
use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let dashboard = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/{*rest}", get(pages::dashboard))
        .route_layer(middleware::from_fn(auth::require_session));

    let sign_in = Router::new()
        .route("/login", get(pages::login))
        .route("/onboarding", get(pages::onboarding))
        .route_layer(middleware::from_fn(auth::redirect_signed_in));

    Router::new()
        .route("/", get(pages::landing))
        .route("/reset-password", get(pages::reset_password))
        .route("/loading", get(pages::loading))
        .route("/auth/callback", get(auth::callback))
        .route("/api/usage", get(usage::get_usage))
        .route("/api/scan-food", post(ai::scan_food))
        .route("/api/ai-chef", post(ai::ai_chef))
        .route("/api/stripe/checkout", post(stripe::checkout))
        .route("/api/stripe/webhook", post(stripe::webhook))
        .route("/capacitor.config.json", get(shell_config))
        .route("/healthz", get(healthz))
        .merge(dashboard)
        .merge(sign_in)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shell_config(State(state): State<AppState>) -> Json<ShellConfig> {
    Json(state.shell.as_ref().clone())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
