//! AI chef: answers a household's "what should we cook?" questions.
//!
//! The household context (pantry, members, allergies, recent meals) comes
//! from the client as free-form JSON and is embedded verbatim in the system
//! prompt. One LLM call per request, bounded by [`CHEF_DEADLINE`].

use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::llm::types::{LlmError, Message};
use crate::rate_limit::RateLimitError;
use crate::state::AppState;

const CHEF_MAX_TOKENS: u32 = 1024;

/// Upper bound on one chef call, kept under a typical 60 s proxy timeout.
pub const CHEF_DEADLINE: Duration = Duration::from_secs(55);

pub const FALLBACK_REPLY: &str = "I apologize, but I could not generate a response.";

#[derive(Debug, thiserror::Error)]
pub enum ChefError {
    #[error("Message is required")]
    MissingMessage,
    #[error("rate limited: {0}")]
    RateLimited(#[from] RateLimitError),
    #[error("LLM not configured")]
    NotConfigured,
    #[error("chef request timed out")]
    Timeout,
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Request body of `POST /api/ai-chef`. `message` stays untyped so a
/// non-string value is reported as a missing message, not a JSON error.
#[derive(Debug, Default, Deserialize)]
pub struct ChefRequest {
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub context: serde_json::Value,
}

/// Ask the chef and return its reply text.
///
/// # Errors
///
/// Returns a [`ChefError`] for a missing message, an exhausted rate limit,
/// an unconfigured model, the deadline, or a provider failure.
pub async fn ask_chef(state: &AppState, client_key: &str, req: ChefRequest) -> Result<String, ChefError> {
    let message = match req.message {
        Some(serde_json::Value::String(m)) if !m.is_empty() => m,
        _ => return Err(ChefError::MissingMessage),
    };

    state.rate_limiter.check_and_record(client_key)?;
    let llm = state.llm.as_ref().ok_or(ChefError::NotConfigured)?;

    let system = system_prompt(&req.context);
    let messages = [Message::user_text(message)];

    let response = tokio::time::timeout(state.chef_deadline, llm.chat(CHEF_MAX_TOKENS, Some(&system), &messages))
        .await
        .map_err(|_| ChefError::Timeout)?
        .map_err(|e| match e {
            LlmError::Timeout => ChefError::Timeout,
            other => ChefError::Llm(other),
        })?;

    info!(
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "chef: reply generated"
    );
    Ok(response.first_text().unwrap_or(FALLBACK_REPLY).to_owned())
}

pub(crate) fn system_prompt(context: &serde_json::Value) -> String {
    let context_json = serde_json::to_string_pretty(context).unwrap_or_else(|_| "null".into());
    format!(
        "You are the AI Chef for BestMealMate, a family meal planning app.

Your job is to help families decide what to cook based on:
1. What ingredients they have (especially expiring items)
2. Each family member's dietary restrictions and allergies
3. How much time they have to cook
4. What they've eaten recently (to ensure variety)

Current context:
{context_json}

Guidelines:
- Always prioritize safety (allergies are serious!)
- Suggest meals that work for EVERYONE in the family
- Prefer using ingredients that are expiring soon
- Be friendly, helpful, and concise
- When suggesting a meal, explain why it's a good fit
- If asked for a recipe, provide clear step-by-step instructions"
    )
}

#[cfg(test)]
#[path = "chef_test.rs"]
mod tests;
