//! Subscription checkout through Stripe Checkout Sessions.
//!
//! ARCHITECTURE
//! ============
//! Validation, tier → price resolution, and return-URL construction live in
//! [`start_checkout`]. The network call sits behind [`CheckoutGateway`] so
//! the Stripe form encoding is isolated in [`StripeClient`].

use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::config::env_or_empty;

const STRIPE_API_URL: &str = "https://api.stripe.com/v1/checkout/sessions";
const STRIPE_API_VERSION: &str = "2023-10-16";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

pub const TRIAL_PERIOD_DAYS: u32 = 14;
const FALLBACK_APP_URL: &str = "http://localhost:3000";

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Missing required fields: householdId, tier, and email are required")]
    MissingFields,
    #[error("Invalid tier. Must be \"premium\" or \"family\"")]
    InvalidTier,
    #[error("Price ID not configured for this tier")]
    PriceNotConfigured,
    #[error("Stripe is not configured")]
    NotConfigured,
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
    #[error("stripe request failed: {0}")]
    Request(String),
    #[error("stripe rejected checkout ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected stripe response: {0}")]
    Parse(String),
}

/// Paid subscription tiers that can be purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidTier {
    Premium,
    Family,
}

impl PaidTier {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "premium" => Some(Self::Premium),
            "family" => Some(Self::Family),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::Family => "family",
        }
    }
}

/// Stripe price ids per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripePrices {
    pub premium: Option<String>,
    pub family: Option<String>,
}

impl StripePrices {
    /// Load from `STRIPE_PREMIUM_PRICE_ID` and `STRIPE_FAMILY_PRICE_ID`.
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |key: &str| Some(env_or_empty(key)).filter(|v| !v.is_empty());
        Self { premium: non_empty("STRIPE_PREMIUM_PRICE_ID"), family: non_empty("STRIPE_FAMILY_PRICE_ID") }
    }

    #[must_use]
    pub fn for_tier(&self, tier: PaidTier) -> Option<&str> {
        match tier {
            PaidTier::Premium => self.premium.as_deref(),
            PaidTier::Family => self.family.as_deref(),
        }
    }
}

/// Request body of `POST /api/stripe/checkout`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub household_id: Option<String>,
    pub tier: Option<String>,
    pub email: Option<String>,
}

/// Everything Stripe needs to open one subscription checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionParams {
    pub price_id: String,
    pub customer_email: String,
    pub household_id: String,
    pub tier: PaidTier,
    pub success_url: String,
    pub cancel_url: String,
    pub trial_period_days: u32,
}

impl CheckoutSessionParams {
    /// Stripe's bracketed form encoding for a subscription checkout.
    #[must_use]
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "subscription".into()),
            ("payment_method_types[0]", "card".into()),
            ("customer_email", self.customer_email.clone()),
            ("line_items[0][price]", self.price_id.clone()),
            ("line_items[0][quantity]", "1".into()),
            ("metadata[household_id]", self.household_id.clone()),
            ("metadata[tier]", self.tier.as_str().into()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("subscription_data[trial_period_days]", self.trial_period_days.to_string()),
        ]
    }
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait::async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] when the payment provider rejects the
    /// session or cannot be reached.
    async fn create_checkout_session(&self, params: &CheckoutSessionParams) -> Result<CheckoutSession, CheckoutError>;
}

/// Validate a checkout request and open a Stripe session.
///
/// Returns the hosted checkout URL.
///
/// # Errors
///
/// Returns a [`CheckoutError`] for missing fields, an unknown tier, an
/// unconfigured price or gateway, or a provider failure.
pub async fn start_checkout(
    gateway: Option<&dyn CheckoutGateway>,
    prices: &StripePrices,
    app_url: &str,
    req: CheckoutRequest,
) -> Result<Option<String>, CheckoutError> {
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(household_id), Some(tier), Some(email)) = (present(req.household_id), present(req.tier), present(req.email))
    else {
        return Err(CheckoutError::MissingFields);
    };

    let tier = PaidTier::parse(&tier).ok_or(CheckoutError::InvalidTier)?;
    let price_id = prices.for_tier(tier).ok_or(CheckoutError::PriceNotConfigured)?;
    let gateway = gateway.ok_or(CheckoutError::NotConfigured)?;

    let app_url = if app_url.is_empty() { FALLBACK_APP_URL } else { app_url };
    let params = CheckoutSessionParams {
        price_id: price_id.to_owned(),
        customer_email: email,
        household_id,
        tier,
        success_url: format!("{app_url}/dashboard?upgraded=true"),
        cancel_url: format!("{app_url}/dashboard/settings"),
        trial_period_days: TRIAL_PERIOD_DAYS,
    };

    let session = gateway.create_checkout_session(&params).await?;
    info!(session_id = %session.id, household_id = %params.household_id, tier = tier.as_str(), "checkout: session created");
    Ok(session.url)
}

// =============================================================================
// STRIPE CLIENT
// =============================================================================

pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(secret_key: String) -> Result<Self, CheckoutError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| CheckoutError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, secret_key })
    }

    /// Build from `STRIPE_SECRET_KEY`; `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_env() -> Result<Option<Self>, CheckoutError> {
        let key = env_or_empty("STRIPE_SECRET_KEY");
        if key.is_empty() {
            return Ok(None);
        }
        Self::new(key).map(Some)
    }
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[async_trait::async_trait]
impl CheckoutGateway for StripeClient {
    async fn create_checkout_session(&self, params: &CheckoutSessionParams) -> Result<CheckoutSession, CheckoutError> {
        let resp = self
            .http
            .post(STRIPE_API_URL)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(&params.to_form())
            .send()
            .await
            .map_err(|e| CheckoutError::Request(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| CheckoutError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(CheckoutError::Rejected { status: status.as_u16(), message: stripe_error_message(&body) });
        }

        serde_json::from_str(&body).map_err(|e| CheckoutError::Parse(e.to_string()))
    }
}

pub(crate) fn stripe_error_message(body: &str) -> String {
    serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| "unknown error".into())
}

#[cfg(test)]
#[path = "checkout_test.rs"]
mod tests;
