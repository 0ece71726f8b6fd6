//! Stripe webhook: keeps household subscription columns in step with Stripe.
//!
//! DESIGN
//! ======
//! The raw body is verified against the `Stripe-Signature` header before it
//! is parsed: HMAC-SHA256 over `"{t}.{body}"` with the endpoint secret, and
//! `t` must be within five minutes of now. Each verified event reduces to a
//! [`SubscriptionChange`] through the pure [`classify_event`], and only
//! changes that touch the database reach the [`SubscriptionStore`].
//!
//! TRADE-OFFS
//! ==========
//! A subscription counts as paid while Stripe reports it `active` or
//! `trialing`; checkout always opens with a trial, so treating `trialing`
//! as free would downgrade every new subscriber on the first update event.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::checkout::{PaidTier, StripePrices};
use super::usage::PgHouseholdStore;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed timestamp, in either direction.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

const FREE_TIER: &str = "free";
const CANCELED_STATUS: &str = "canceled";

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Missing signature or webhook secret")]
    MissingSignature,
    #[error("malformed Stripe-Signature header")]
    MalformedHeader,
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("event parse failed: {0}")]
    Parse(String),
    #[error("subscription store not configured")]
    NotConfigured,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

// =============================================================================
// SIGNATURE
// =============================================================================

/// Check a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`)
/// against the raw payload as of `now` (unix seconds).
///
/// # Errors
///
/// [`WebhookError::MalformedHeader`] when `t` or every `v1` is missing,
/// [`WebhookError::StaleTimestamp`] outside the tolerance, and
/// [`WebhookError::SignatureMismatch`] when no `v1` matches.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, now: i64) -> Result<(), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader);
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::StaleTimestamp);
    }

    let matched = signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|expected| signature_matches(secret, timestamp, payload, &expected));
    if matched { Ok(()) } else { Err(WebhookError::SignatureMismatch) }
}

fn signature_matches(secret: &str, timestamp: i64, payload: &[u8], expected: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.verify_slice(expected).is_ok()
}

// =============================================================================
// EVENTS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[derive(Deserialize)]
struct CheckoutSessionObject {
    customer: Option<String>,
    subscription: Option<String>,
    metadata: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    items: SubscriptionItems,
}

#[derive(Default, Deserialize)]
struct SubscriptionItems {
    #[serde(default)]
    data: Vec<SubscriptionItem>,
}

#[derive(Deserialize)]
struct SubscriptionItem {
    price: PriceRef,
}

#[derive(Deserialize)]
struct PriceRef {
    id: String,
}

#[derive(Deserialize)]
struct InvoiceObject {
    customer: Option<String>,
}

/// What one webhook event means for the households table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionChange {
    /// Checkout finished for a household named in the session metadata.
    Activated {
        household_id: String,
        tier: PaidTier,
        customer_id: Option<String>,
        subscription_id: Option<String>,
    },
    /// Subscription changed; `tier` is `None` once it stops being paid.
    Updated {
        customer_id: String,
        subscription_id: String,
        tier: Option<PaidTier>,
        status: String,
    },
    /// Subscription ended; the customer's household drops to free.
    Cancelled { customer_id: String },
    /// Logged only.
    PaymentFailed { customer_id: Option<String> },
    Ignored,
}

impl SubscriptionChange {
    fn touches_store(&self) -> bool {
        matches!(self, Self::Activated { .. } | Self::Updated { .. } | Self::Cancelled { .. })
    }
}

fn object<T: DeserializeOwned>(event: &StripeEvent) -> Result<T, WebhookError> {
    T::deserialize(&event.data.object).map_err(|e| WebhookError::Parse(e.to_string()))
}

fn tier_for_price(prices: &StripePrices, price_id: &str) -> Option<PaidTier> {
    [PaidTier::Premium, PaidTier::Family]
        .into_iter()
        .find(|&tier| prices.for_tier(tier) == Some(price_id))
}

/// Reduce a verified event to the change it implies.
///
/// # Errors
///
/// Returns [`WebhookError::Parse`] when a handled event's object does not
/// have the expected shape.
pub fn classify_event(event: &StripeEvent, prices: &StripePrices) -> Result<SubscriptionChange, WebhookError> {
    let change = match event.kind.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSessionObject = object(event)?;
            let metadata = session.metadata.unwrap_or_default();
            let household_id = metadata.get("household_id").filter(|id| !id.is_empty());
            let tier = metadata.get("tier").and_then(|t| PaidTier::parse(t));
            match (household_id, tier) {
                (Some(household_id), Some(tier)) => SubscriptionChange::Activated {
                    household_id: household_id.clone(),
                    tier,
                    customer_id: session.customer,
                    subscription_id: session.subscription,
                },
                _ => SubscriptionChange::Ignored,
            }
        }
        "customer.subscription.updated" => {
            let subscription: SubscriptionObject = object(event)?;
            let Some(customer_id) = subscription.customer else {
                return Ok(SubscriptionChange::Ignored);
            };
            let paid = matches!(subscription.status.as_str(), "active" | "trialing");
            let tier = subscription
                .items
                .data
                .first()
                .and_then(|item| tier_for_price(prices, &item.price.id))
                .filter(|_| paid);
            SubscriptionChange::Updated {
                customer_id,
                subscription_id: subscription.id,
                tier,
                status: subscription.status,
            }
        }
        "customer.subscription.deleted" => {
            let subscription: SubscriptionObject = object(event)?;
            match subscription.customer {
                Some(customer_id) => SubscriptionChange::Cancelled { customer_id },
                None => SubscriptionChange::Ignored,
            }
        }
        "invoice.payment_failed" => {
            let invoice: InvoiceObject = object(event)?;
            SubscriptionChange::PaymentFailed { customer_id: invoice.customer }
        }
        _ => SubscriptionChange::Ignored,
    };
    Ok(change)
}

// =============================================================================
// STORE
// =============================================================================

/// Write access to the subscription columns of `households`.
#[async_trait::async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Apply one change. Changes that match no household are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store fails.
    async fn apply(&self, change: &SubscriptionChange) -> Result<(), WebhookError>;
}

#[async_trait::async_trait]
impl SubscriptionStore for PgHouseholdStore {
    async fn apply(&self, change: &SubscriptionChange) -> Result<(), WebhookError> {
        let result = match change {
            SubscriptionChange::Activated { household_id, tier, customer_id, subscription_id } => {
                sqlx::query(
                    r"UPDATE households
                      SET subscription_tier = $2,
                          stripe_customer_id = $3,
                          stripe_subscription_id = $4
                      WHERE id::text = $1",
                )
                .bind(household_id)
                .bind(tier.as_str())
                .bind(customer_id)
                .bind(subscription_id)
                .execute(self.pool())
                .await?
            }
            SubscriptionChange::Updated { customer_id, subscription_id, tier, status } => {
                sqlx::query(
                    r"UPDATE households
                      SET subscription_tier = $2,
                          subscription_status = $3,
                          stripe_subscription_id = $4
                      WHERE stripe_customer_id = $1",
                )
                .bind(customer_id)
                .bind(tier.map_or(FREE_TIER, PaidTier::as_str))
                .bind(status)
                .bind(subscription_id)
                .execute(self.pool())
                .await?
            }
            SubscriptionChange::Cancelled { customer_id } => {
                sqlx::query(
                    r"UPDATE households
                      SET subscription_tier = $2,
                          subscription_status = $3,
                          stripe_subscription_id = NULL
                      WHERE stripe_customer_id = $1",
                )
                .bind(customer_id)
                .bind(FREE_TIER)
                .bind(CANCELED_STATUS)
                .execute(self.pool())
                .await?
            }
            SubscriptionChange::PaymentFailed { .. } | SubscriptionChange::Ignored => return Ok(()),
        };

        if result.rows_affected() == 0 {
            warn!(?change, "stripe webhook: no household matched");
        }
        Ok(())
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Verify, classify, and apply one webhook delivery.
///
/// # Errors
///
/// Returns a [`WebhookError`] for a missing or invalid signature, an
/// unreadable event, or a store failure.
pub async fn handle_webhook(
    store: Option<&dyn SubscriptionStore>,
    secret: Option<&str>,
    prices: &StripePrices,
    payload: &[u8],
    signature: Option<&str>,
) -> Result<(), WebhookError> {
    let (Some(signature), Some(secret)) = (non_empty(signature), non_empty(secret)) else {
        return Err(WebhookError::MissingSignature);
    };

    verify_signature(payload, signature, secret, OffsetDateTime::now_utc().unix_timestamp())?;
    let event: StripeEvent = serde_json::from_slice(payload).map_err(|e| WebhookError::Parse(e.to_string()))?;
    let change = classify_event(&event, prices)?;

    match &change {
        SubscriptionChange::PaymentFailed { customer_id } => {
            warn!(customer_id = customer_id.as_deref().unwrap_or("unknown"), "stripe webhook: invoice payment failed");
        }
        SubscriptionChange::Ignored => debug!(event_type = %event.kind, "stripe webhook: event ignored"),
        _ => {}
    }
    if !change.touches_store() {
        return Ok(());
    }

    let store = store.ok_or(WebhookError::NotConfigured)?;
    store.apply(&change).await?;
    info!(event_type = %event.kind, "stripe webhook: subscription synced");
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "billing_test.rs"]
mod tests;
