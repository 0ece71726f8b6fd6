//! Usage statistics: weekly AI suggestion allowance per household.
//!
//! DESIGN
//! ======
//! The households table is owned by Supabase. This module reads one row
//! through the [`HouseholdStore`] seam and projects it into [`UsageStats`];
//! the projection is pure (`UsageStats::project`) so the weekly-reset and
//! tier-limit rules are testable without a database.

use serde::Serialize;
use sqlx::{PgPool, Row};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Suggestions per week on the free tier, and the fallback for unknown tiers.
pub const FREE_WEEKLY_LIMIT: i64 = 5;
/// Sentinel limit meaning "no cap".
pub const UNLIMITED: i64 = -1;

const USAGE_WINDOW: Duration = Duration::days(7);

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("household store not configured")]
    NotConfigured,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Columns of `households` the usage projection reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HouseholdUsageRow {
    pub subscription_tier: Option<String>,
    pub ai_suggestions_this_week: Option<i32>,
    pub ai_suggestions_reset_at: Option<OffsetDateTime>,
    pub trial_ends_at: Option<OffsetDateTime>,
    pub subscription_status: Option<String>,
}

/// Usage projection returned by `GET /api/usage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub suggestions_used: i64,
    pub suggestions_limit: i64,
    pub reset_date: Option<String>,
    pub tier: String,
    pub trial_ends: Option<String>,
    pub status: String,
    pub is_unlimited: bool,
    #[serde(rename = "canUseAI")]
    pub can_use_ai: bool,
    pub remaining_suggestions: i64,
}

/// Weekly suggestion cap for a subscription tier.
#[must_use]
pub fn weekly_limit(tier: &str) -> i64 {
    match tier {
        "premium" | "family" => UNLIMITED,
        _ => FREE_WEEKLY_LIMIT,
    }
}

impl UsageStats {
    /// Project a household row into usage stats as of `now`.
    ///
    /// A reset timestamp older than one week means the counter is stale and
    /// reports zero; the stored counter is reset on the next recorded use.
    #[must_use]
    pub fn project(row: &HouseholdUsageRow, now: OffsetDateTime) -> Self {
        let tier = non_empty(row.subscription_tier.as_deref()).unwrap_or("free").to_owned();
        let limit = weekly_limit(&tier);
        let is_unlimited = limit == UNLIMITED;

        let reset_at = row.ai_suggestions_reset_at.unwrap_or(now);
        let used = if reset_at < now - USAGE_WINDOW { 0 } else { i64::from(row.ai_suggestions_this_week.unwrap_or(0)) };

        Self {
            suggestions_used: used,
            suggestions_limit: limit,
            reset_date: format_timestamp(reset_at + USAGE_WINDOW),
            tier,
            trial_ends: row.trial_ends_at.and_then(format_timestamp),
            status: non_empty(row.subscription_status.as_deref())
                .unwrap_or("active")
                .to_owned(),
            is_unlimited,
            can_use_ai: is_unlimited || used < limit,
            remaining_suggestions: if is_unlimited { UNLIMITED } else { (limit - used).max(0) },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn format_timestamp(ts: OffsetDateTime) -> Option<String> {
    ts.format(&Rfc3339).ok()
}

// =============================================================================
// STORE
// =============================================================================

/// Read access to household rows. Implemented over Postgres in production
/// and over a map in tests.
#[async_trait::async_trait]
pub trait HouseholdStore: Send + Sync {
    /// Fetch the usage columns for one household, `None` when no row matches.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store fails.
    async fn find_usage_row(&self, household_id: &str) -> Result<Option<HouseholdUsageRow>, UsageError>;
}

pub struct PgHouseholdStore {
    pool: PgPool,
}

impl PgHouseholdStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl HouseholdStore for PgHouseholdStore {
    async fn find_usage_row(&self, household_id: &str) -> Result<Option<HouseholdUsageRow>, UsageError> {
        // Compare as text so a malformed id is simply "not found" rather than a cast error.
        let row = sqlx::query(
            r"SELECT subscription_tier,
                     ai_suggestions_this_week,
                     ai_suggestions_reset_at,
                     trial_ends_at,
                     subscription_status
              FROM households
              WHERE id::text = $1",
        )
        .bind(household_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some(HouseholdUsageRow {
            subscription_tier: r.try_get("subscription_tier")?,
            ai_suggestions_this_week: r.try_get("ai_suggestions_this_week")?,
            ai_suggestions_reset_at: r.try_get("ai_suggestions_reset_at")?,
            trial_ends_at: r.try_get("trial_ends_at")?,
            subscription_status: r.try_get("subscription_status")?,
        }))
    }
}

/// Look up usage stats for a household; `Ok(None)` when it does not exist.
///
/// # Errors
///
/// Returns [`UsageError::NotConfigured`] when no store is wired in, or the
/// store's error when the lookup fails.
pub async fn get_usage_stats(
    store: Option<&dyn HouseholdStore>,
    household_id: &str,
) -> Result<Option<UsageStats>, UsageError> {
    let store = store.ok_or(UsageError::NotConfigured)?;
    let row = store.find_usage_row(household_id).await?;
    Ok(row.map(|r| UsageStats::project(&r, OffsetDateTime::now_utc())))
}

#[cfg(test)]
#[path = "usage_test.rs"]
mod tests;
