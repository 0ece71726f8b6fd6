//! Food scan service: camera image or barcode → pantry items.
//!
//! DESIGN
//! ======
//! Barcodes resolve through the [`ProductLookup`] catalogue. Images go to the
//! LLM with a recognition prompt; the first JSON object in the reply is
//! parsed item by item, so one malformed entry does not discard the rest.
//!
//! TRADE-OFFS
//! ==========
//! When the AI call fails (including "not configured") the scan answers
//! with a fixed demo inventory instead of an error, so the scanner screen
//! always has something to render. The failure is logged at `warn`.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::food_facts::ProductLookup;
use crate::llm::types::{ContentBlock, ImageSource, LlmError, Message};
use crate::rate_limit::RateLimitError;
use crate::state::AppState;

const SCAN_MAX_TOKENS: u32 = 2048;
const DEFAULT_LOCATION: &str = "kitchen storage area";
const DEFAULT_EXPIRY_DAYS: u32 = 14;
const MAX_BARCODE_LEN: usize = 32;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("No image provided")]
    NoImage,
    #[error("Invalid image format")]
    InvalidImageFormat,
    #[error("Invalid barcode")]
    InvalidBarcode,
    #[error("Product not found for barcode")]
    ProductNotFound,
    #[error("rate limited: {0}")]
    RateLimited(#[from] RateLimitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Freshness {
    Fresh,
    Good,
    UseSoon,
    Expired,
}

impl Freshness {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "fresh" => Some(Self::Fresh),
            "good" => Some(Self::Good),
            "use-soon" => Some(Self::UseSoon),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Unknown freshness labels from the model are dropped rather than failing the item.
fn lenient_freshness<'de, D>(deserializer: D) -> Result<Option<Freshness>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Freshness::parse))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedItem {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_days: Option<u32>,
    #[serde(default, deserialize_with = "lenient_freshness", skip_serializing_if = "Option::is_none")]
    pub freshness: Option<Freshness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Camera,
    Barcode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionSummary {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub items: Vec<DetectedItem>,
    pub scan_type: ScanType,
    pub total_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition_summary: Option<NutritionSummary>,
}

impl ScanResponse {
    fn camera(items: Vec<DetectedItem>) -> Self {
        let nutrition_summary = NutritionSummary::of(&items);
        Self { total_items: items.len(), items, scan_type: ScanType::Camera, nutrition_summary }
    }
}

/// Request body of `POST /api/scan-food`.
#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    pub image: Option<String>,
    pub location: Option<String>,
    pub barcode: Option<String>,
}

impl NutritionSummary {
    /// Totals across items; `None` for an empty scan.
    #[must_use]
    pub fn of(items: &[DetectedItem]) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        let sum = |f: fn(&DetectedItem) -> Option<f64>| items.iter().filter_map(f).sum::<f64>();
        Some(Self {
            total_calories: sum(|i| i.calories),
            total_protein: sum(|i| i.protein),
            total_carbs: sum(|i| i.carbs),
            total_fat: sum(|i| i.fat),
        })
    }
}

/// Typical shelf life in days by pantry category.
#[must_use]
pub fn shelf_life_days(category: &str) -> u32 {
    match category {
        "produce" => 7,
        "meat" => 3,
        "dairy" => 14,
        "pantry" | "condiments" | "grains" => 180,
        "frozen" => 90,
        "spices" => 365,
        "beverages" => 30,
        _ => DEFAULT_EXPIRY_DAYS,
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Run one scan request.
///
/// # Errors
///
/// Returns a [`ScanError`] for invalid input, unknown barcodes, or when the
/// AI rate limit is exhausted. AI failures fall back to the demo inventory.
pub async fn scan_food(state: &AppState, client_key: &str, req: ScanRequest) -> Result<ScanResponse, ScanError> {
    if let Some(barcode) = non_empty(req.barcode.as_deref()) {
        return scan_barcode(state.products.as_ref(), barcode).await;
    }

    let image = non_empty(req.image.as_deref()).ok_or(ScanError::NoImage)?;
    let (media_type, data) = parse_data_url(image).ok_or(ScanError::InvalidImageFormat)?;

    state.rate_limiter.check_and_record(client_key)?;

    let location = non_empty(req.location.as_deref()).unwrap_or(DEFAULT_LOCATION);
    match recognize_items(state, media_type, data, location).await {
        Ok(items) => {
            info!(items = items.len(), "scan: image recognized");
            Ok(ScanResponse::camera(items))
        }
        Err(e) => {
            warn!(error = %e, "scan: recognition failed; serving demo inventory");
            Ok(demo_inventory())
        }
    }
}

async fn scan_barcode(products: &dyn ProductLookup, barcode: &str) -> Result<ScanResponse, ScanError> {
    if barcode.len() > MAX_BARCODE_LEN || !barcode.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScanError::InvalidBarcode);
    }

    let item = match products.lookup(barcode).await {
        Ok(item) => item,
        Err(e) => {
            warn!(error = %e, %barcode, "scan: barcode lookup failed");
            None
        }
    };

    let item = item.ok_or(ScanError::ProductNotFound)?;
    Ok(ScanResponse { items: vec![item], scan_type: ScanType::Barcode, total_items: 1, nutrition_summary: None })
}

#[derive(Debug, thiserror::Error)]
enum RecognizeError {
    #[error("LLM not configured")]
    NotConfigured,
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("no text response from AI")]
    NoText,
}

async fn recognize_items(
    state: &AppState,
    media_type: String,
    data: &str,
    location: &str,
) -> Result<Vec<DetectedItem>, RecognizeError> {
    let llm = state.llm.as_ref().ok_or(RecognizeError::NotConfigured)?;

    let messages = vec![Message::user_blocks(vec![
        ContentBlock::Image { source: ImageSource::base64(media_type, data) },
        ContentBlock::Text { text: recognition_prompt(location) },
    ])];

    let response = llm.chat(SCAN_MAX_TOKENS, None, &messages).await?;
    let text = response.first_text().ok_or(RecognizeError::NoText)?;
    Ok(parse_detected_items(text))
}

// =============================================================================
// HELPERS
// =============================================================================

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Split `data:image/<fmt>;base64,<payload>` into (`image/<fmt>`, payload).
pub(crate) fn parse_data_url(raw: &str) -> Option<(String, &str)> {
    let rest = raw.strip_prefix("data:image/")?;
    let (format, rest) = rest.split_once(';')?;
    let payload = rest.strip_prefix("base64,")?;
    let valid_format = !format.is_empty() && format.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !valid_format || payload.is_empty() {
        return None;
    }
    Some((format!("image/{format}"), payload))
}

/// Parse the model reply: the first `{` to the last `}` must hold an
/// `items` array. Entries that do not deserialize are skipped.
pub(crate) fn parse_detected_items(text: &str) -> Vec<DetectedItem> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    let parsed: serde_json::Value = match serde_json::from_str(&text[start..=end]) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "scan: AI reply is not valid JSON");
            return Vec::new();
        }
    };

    let Some(entries) = parsed.get("items").and_then(serde_json::Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<DetectedItem>(entry.clone()).ok())
        .map(|mut item| {
            item.expiry_days = Some(shelf_life_days(&item.category));
            item
        })
        .collect()
}

fn recognition_prompt(location: &str) -> String {
    format!(
        r#"You are an expert food recognition AI analyzing an image of food items in a {location}.

Identify ALL visible food items and provide detailed nutritional estimates. Return a JSON object:

{{
  "items": [
    {{
      "name": "Specific item name (e.g., 'Organic Whole Milk' not just 'Milk')",
      "quantity": "Estimated quantity with unit (e.g., '1 gallon', '2 lbs', '6 count', '500g')",
      "category": "One of: produce, meat, dairy, pantry, frozen, spices, condiments, grains, beverages",
      "confidence": 0.95,
      "calories": 150,
      "protein": 8,
      "carbs": 12,
      "fat": 8,
      "freshness": "fresh"
    }}
  ]
}}

Guidelines:
- Be specific with item names and include the brand if it is visible
- Nutrition values are per typical serving
- Freshness is one of "fresh", "good", "use-soon", "expired"
- Confidence is between 0 and 1 and reflects image clarity
- Include every visible food item

Return ONLY valid JSON, no markdown or extra text."#
    )
}

fn demo_item(
    name: &str,
    quantity: &str,
    category: &str,
    confidence: f64,
    macros: [f64; 4],
    expiry_days: u32,
    freshness: Freshness,
) -> DetectedItem {
    let [calories, protein, carbs, fat] = macros;
    DetectedItem {
        name: name.into(),
        quantity: quantity.into(),
        category: category.into(),
        confidence,
        calories: Some(calories),
        protein: Some(protein),
        carbs: Some(carbs),
        fat: Some(fat),
        expiry_days: Some(expiry_days),
        freshness: Some(freshness),
        barcode: None,
    }
}

/// Fixed inventory served when image recognition is unavailable.
#[must_use]
pub fn demo_inventory() -> ScanResponse {
    let items = vec![
        demo_item("Organic Whole Milk", "1 gallon", "dairy", 0.95, [150.0, 8.0, 12.0, 8.0], 14, Freshness::Fresh),
        demo_item("Large Brown Eggs", "1 dozen", "dairy", 0.92, [70.0, 6.0, 0.0, 5.0], 21, Freshness::Fresh),
        demo_item("Grass-Fed Butter", "2 sticks", "dairy", 0.88, [100.0, 0.0, 0.0, 11.0], 30, Freshness::Good),
        demo_item("Fresh Orange Juice", "1/2 gallon", "beverages", 0.85, [110.0, 2.0, 26.0, 0.0], 7, Freshness::Fresh),
        demo_item("Sharp Cheddar Cheese", "8 oz", "dairy", 0.82, [110.0, 7.0, 1.0, 9.0], 21, Freshness::Good),
    ];
    ScanResponse::camera(items)
}

#[cfg(test)]
#[path = "scan_test.rs"]
mod tests;
