//! Usage route: weekly AI allowance for a household.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::services::usage::{self, UsageStats};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageQuery {
    household_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    success: bool,
    usage: UsageStats,
}

/// `GET /api/usage?householdId=<id>`
pub async fn get_usage(
    State(state): State<AppState>,
    query: Result<Query<UsageQuery>, QueryRejection>,
) -> Result<Json<UsageResponse>, ApiError> {
    let params = query.map(|Query(q)| q).unwrap_or_default();
    let Some(household_id) = params.household_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::bad_request("householdId is required"));
    };

    let stats = usage::get_usage_stats(state.households.as_deref(), &household_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Household not found"))?;

    Ok(Json(UsageResponse { success: true, usage: stats }))
}

#[cfg(test)]
#[path = "usage_test.rs"]
mod tests;
