//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Every external collaborator sits behind a trait object so handlers never
//! name a concrete client. Integrations that need credentials are optional
//! and report "not configured" per request when absent.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::llm::LlmChat;
use crate::mobile::ShellConfig;
use crate::rate_limit::RateLimiter;
use crate::services::billing::SubscriptionStore;
use crate::services::checkout::{CheckoutGateway, StripePrices};
use crate::services::chef::CHEF_DEADLINE;
use crate::services::food_facts::ProductLookup;
use crate::services::identity::SessionExchange;
use crate::services::usage::HouseholdStore;

/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Household rows for usage stats. `None` without `DATABASE_URL`.
    pub households: Option<Arc<dyn HouseholdStore>>,
    /// OAuth code exchange for the auth callback.
    pub identity: Arc<dyn SessionExchange>,
    /// Optional LLM client. `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    /// Barcode catalogue for the food scanner.
    pub products: Arc<dyn ProductLookup>,
    /// Optional payment gateway. `None` without `STRIPE_SECRET_KEY`.
    pub checkout: Option<Arc<dyn CheckoutGateway>>,
    /// Subscription writes from the Stripe webhook. `None` without `DATABASE_URL`.
    pub subscriptions: Option<Arc<dyn SubscriptionStore>>,
    pub prices: StripePrices,
    pub shell: Arc<ShellConfig>,
    /// In-memory rate limiter for AI requests.
    pub rate_limiter: RateLimiter,
    pub chef_deadline: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AppConfig,
        shell: ShellConfig,
        identity: Arc<dyn SessionExchange>,
        products: Arc<dyn ProductLookup>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            households: None,
            identity,
            llm: None,
            products,
            checkout: None,
            subscriptions: None,
            prices: StripePrices::default(),
            shell: Arc::new(shell),
            rate_limiter: RateLimiter::default(),
            chef_deadline: CHEF_DEADLINE,
        }
    }

    #[must_use]
    pub fn with_households(mut self, store: Arc<dyn HouseholdStore>) -> Self {
        self.households = Some(store);
        self
    }

    #[must_use]
    pub fn with_llm(mut self, llm: Arc<dyn LlmChat>) -> Self {
        self.llm = Some(llm);
        self
    }

    #[must_use]
    pub fn with_checkout(mut self, gateway: Arc<dyn CheckoutGateway>) -> Self {
        self.checkout = Some(gateway);
        self
    }

    #[must_use]
    pub fn with_subscriptions(mut self, store: Arc<dyn SubscriptionStore>) -> Self {
        self.subscriptions = Some(store);
        self
    }

    #[must_use]
    pub fn with_prices(mut self, prices: StripePrices) -> Self {
        self.prices = prices;
        self
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
