mod config;
mod db;
mod llm;
mod mobile;
mod pages;
mod rate_limit;
mod routes;
mod services;
mod state;


use std::sync::Arc;

use services::checkout::{StripeClient, StripePrices};
use services::food_facts::OpenFoodFactsClient;
use services::identity::SupabaseAuthClient;
use services::usage::PgHouseholdStore;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env();
    let port = config.port;

    let shell = mobile::ShellConfig::bundled().expect("bundled capacitor.config.json is invalid");
    shell.warn_on_host_mismatch(&config.app_url);

    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set; billing webhooks will be rejected");
    }
    if !config.supabase.is_configured() {
        tracing::warn!("Supabase not configured; auth callback will reject codes");
    }
    let identity = SupabaseAuthClient::new(config.supabase.clone()).expect("auth http client init failed");
    let products = OpenFoodFactsClient::new().expect("product lookup http client init failed");

    let households = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            Some(Arc::new(PgHouseholdStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; usage lookups disabled");
            None
        }
    };

    // Initialize LLM client (non-fatal: AI features disabled if config missing).
    let llm = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured; AI features disabled");
            None
        }
    };

    let checkout = match StripeClient::from_env() {
        Ok(Some(client)) => Some(client),
        Ok(None) => {
            tracing::warn!("STRIPE_SECRET_KEY not set; checkout disabled");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stripe client init failed; checkout disabled");
            None
        }
    };

    let mut state = state::AppState::new(config, shell, Arc::new(identity), Arc::new(products))
        .with_prices(StripePrices::from_env());
    if let Some(store) = households {
        state = state.with_households(store.clone()).with_subscriptions(store);
    }
    if let Some(client) = llm {
        state = state.with_llm(Arc::new(client));
    }
    if let Some(client) = checkout {
        state = state.with_checkout(Arc::new(client));
    }

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "bestmealmate listening");
    axum::serve(listener, app).await.expect("server failed");
}
