use super::*;
use crate::state::test_helpers::{MockCheckout, test_prices};

fn full_request(tier: &str) -> CheckoutRequest {
    CheckoutRequest {
        household_id: Some("hh-1".into()),
        tier: Some(tier.into()),
        email: Some("cook@example.com".into()),
    }
}

#[tokio::test]
async fn empty_request_is_missing_fields() {
    let gateway = MockCheckout::succeeding("https://checkout.stripe.com/c/pay/cs_test_123");
    let err = start_checkout(Some(&gateway), &test_prices(), "", CheckoutRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::MissingFields));
    assert_eq!(err.to_string(), "Missing required fields: householdId, tier, and email are required");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn blank_email_is_missing_fields() {
    let mut req = full_request("premium");
    req.email = Some("   ".into());
    let err = start_checkout(None, &test_prices(), "", req).await.unwrap_err();
    assert!(matches!(err, CheckoutError::MissingFields));
}

#[tokio::test]
async fn unknown_tier_is_rejected() {
    let err = start_checkout(None, &test_prices(), "", full_request("platinum"))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidTier));
    assert_eq!(err.to_string(), r#"Invalid tier. Must be "premium" or "family""#);
}

#[tokio::test]
async fn missing_price_is_reported_before_gateway() {
    let prices = StripePrices { premium: Some("price_premium".into()), family: None };
    let err = start_checkout(None, &prices, "", full_request("family")).await.unwrap_err();
    assert!(matches!(err, CheckoutError::PriceNotConfigured));
}

#[tokio::test]
async fn missing_gateway_is_not_configured() {
    let err = start_checkout(None, &test_prices(), "", full_request("premium"))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::NotConfigured));
}

#[tokio::test]
async fn session_params_follow_tier_and_app_url() {
    let gateway = MockCheckout::succeeding("https://checkout.stripe.com/c/pay/cs_test_123");
    let url = start_checkout(Some(&gateway), &test_prices(), "https://www.bestmealmate.com", full_request("family"))
        .await
        .unwrap();
    assert_eq!(url.as_deref(), Some("https://checkout.stripe.com/c/pay/cs_test_123"));

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    let params = &calls[0];
    assert_eq!(params.price_id, "price_family");
    assert_eq!(params.tier, PaidTier::Family);
    assert_eq!(params.household_id, "hh-1");
    assert_eq!(params.success_url, "https://www.bestmealmate.com/dashboard?upgraded=true");
    assert_eq!(params.cancel_url, "https://www.bestmealmate.com/dashboard/settings");
    assert_eq!(params.trial_period_days, 14);
}

#[tokio::test]
async fn empty_app_url_falls_back_to_localhost() {
    let gateway = MockCheckout::succeeding("https://checkout.stripe.com/x");
    start_checkout(Some(&gateway), &test_prices(), "", full_request("premium"))
        .await
        .unwrap();
    assert_eq!(gateway.calls()[0].success_url, "http://localhost:3000/dashboard?upgraded=true");
}

#[tokio::test]
async fn gateway_failure_propagates() {
    let gateway = MockCheckout::failing();
    let err = start_checkout(Some(&gateway), &test_prices(), "", full_request("premium"))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Rejected { status: 400, .. }));
}

#[test]
fn form_uses_stripe_bracket_keys() {
    let params = CheckoutSessionParams {
        price_id: "price_premium".into(),
        customer_email: "cook@example.com".into(),
        household_id: "hh-1".into(),
        tier: PaidTier::Premium,
        success_url: "http://localhost:3000/dashboard?upgraded=true".into(),
        cancel_url: "http://localhost:3000/dashboard/settings".into(),
        trial_period_days: 14,
    };
    let form = params.to_form();
    let get = |key: &str| form.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

    assert_eq!(get("mode"), Some("subscription"));
    assert_eq!(get("payment_method_types[0]"), Some("card"));
    assert_eq!(get("line_items[0][price]"), Some("price_premium"));
    assert_eq!(get("line_items[0][quantity]"), Some("1"));
    assert_eq!(get("metadata[household_id]"), Some("hh-1"));
    assert_eq!(get("metadata[tier]"), Some("premium"));
    assert_eq!(get("subscription_data[trial_period_days]"), Some("14"));
}

#[test]
fn tier_parsing_is_exact() {
    assert_eq!(PaidTier::parse("premium"), Some(PaidTier::Premium));
    assert_eq!(PaidTier::parse("family"), Some(PaidTier::Family));
    assert_eq!(PaidTier::parse("Premium"), None);
    assert_eq!(PaidTier::parse("free"), None);
}

#[test]
fn stripe_error_message_extraction() {
    let body = r#"{"error":{"type":"invalid_request_error","message":"No such price: 'price_x'"}}"#;
    assert_eq!(stripe_error_message(body), "No such price: 'price_x'");
    assert_eq!(stripe_error_message("<html>"), "unknown error");
}

#[test]
fn checkout_session_ignores_extra_fields() {
    let body = r#"{"id":"cs_test_1","object":"checkout.session","url":"https://checkout.stripe.com/c/pay/cs_test_1"}"#;
    let session: CheckoutSession = serde_json::from_str(body).unwrap();
    assert_eq!(session.id, "cs_test_1");
    assert!(session.url.unwrap().starts_with("https://checkout.stripe.com/"));
}
