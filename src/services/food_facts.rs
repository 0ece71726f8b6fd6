//! Barcode product lookup against the Open Food Facts public API.

use std::time::Duration;

use serde::Deserialize;

use super::scan::{DetectedItem, Freshness};

const BASE_URL: &str = "https://world.openfoodfacts.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Packaged goods keep far longer than fresh items; one month is the default.
const BARCODE_EXPIRY_DAYS: u32 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ProductLookupError {
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
    #[error("product lookup request failed: {0}")]
    Request(String),
    #[error("product lookup returned status {0}")]
    Status(u16),
    #[error("product response parse failed: {0}")]
    Parse(String),
}

/// Resolves a barcode to a pantry item.
#[async_trait::async_trait]
pub trait ProductLookup: Send + Sync {
    /// `Ok(None)` when the catalogue has no product for the barcode.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalogue cannot be reached or replies with
    /// something unreadable.
    async fn lookup(&self, barcode: &str) -> Result<Option<DetectedItem>, ProductLookupError>;
}

pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, ProductLookupError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("bestmealmate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProductLookupError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: BASE_URL.to_owned() })
    }
}

#[async_trait::async_trait]
impl ProductLookup for OpenFoodFactsClient {
    async fn lookup(&self, barcode: &str) -> Result<Option<DetectedItem>, ProductLookupError> {
        let url = format!("{}/api/v0/product/{barcode}.json", self.base_url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProductLookupError::Request(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProductLookupError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ProductLookupError::Request(e.to_string()))?;
        parse_product(&body, barcode)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    product: Option<Product>,
}

#[derive(Deserialize)]
struct Product {
    product_name: Option<String>,
    quantity: Option<String>,
    #[serde(default)]
    categories_tags: Vec<String>,
    #[serde(default)]
    nutriments: Nutriments,
}

#[derive(Default, Deserialize)]
struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    energy_kcal_100g: Option<f64>,
    proteins_100g: Option<f64>,
    carbohydrates_100g: Option<f64>,
    fat_100g: Option<f64>,
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_product(body: &str, barcode: &str) -> Result<Option<DetectedItem>, ProductLookupError> {
    let resp: ProductResponse = serde_json::from_str(body).map_err(|e| ProductLookupError::Parse(e.to_string()))?;
    let Some(product) = resp.product.filter(|_| resp.status == 1) else {
        return Ok(None);
    };

    let n = &product.nutriments;
    let per_100g = |v: Option<f64>| Some(v.unwrap_or(0.0).round());

    Ok(Some(DetectedItem {
        name: non_blank(product.product_name).unwrap_or_else(|| "Unknown Product".into()),
        quantity: non_blank(product.quantity).unwrap_or_else(|| "1 unit".into()),
        category: map_category(product.categories_tags.first().map_or("", String::as_str)).into(),
        confidence: 1.0,
        calories: per_100g(n.energy_kcal_100g),
        protein: per_100g(n.proteins_100g),
        carbs: per_100g(n.carbohydrates_100g),
        fat: per_100g(n.fat_100g),
        expiry_days: Some(BARCODE_EXPIRY_DAYS),
        freshness: Some(Freshness::Fresh),
        barcode: Some(barcode.to_owned()),
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Map an Open Food Facts category tag onto a pantry category.
#[must_use]
pub fn map_category(tag: &str) -> &'static str {
    const CATEGORY_MAP: [(&str, &str); 8] = [
        ("en:dairy", "dairy"),
        ("en:meats", "meat"),
        ("en:fruits", "produce"),
        ("en:vegetables", "produce"),
        ("en:beverages", "beverages"),
        ("en:cereals", "grains"),
        ("en:snacks", "pantry"),
        ("en:frozen", "frozen"),
    ];

    CATEGORY_MAP
        .iter()
        .find(|(key, _)| tag.contains(key))
        .map_or("pantry", |(_, category)| category)
}

#[cfg(test)]
#[path = "food_facts_test.rs"]
mod tests;
