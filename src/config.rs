//! Process configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` builds one `AppConfig` at startup and hands it to `AppState`.
//! The public Supabase and app URL settings keep the names the web client
//! uses (`NEXT_PUBLIC_*`) so a single `.env` drives both. Missing public
//! values default to the empty string; integrations that need them report
//! "not configured" at request time instead of failing startup.

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Supabase project coordinates used by the auth session bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`. Empty when unset.
    pub url: String,
    /// Public anon key. Empty when unset.
    pub anon_key: String,
}

impl SupabaseConfig {
    /// Load from `NEXT_PUBLIC_SUPABASE_URL` and `NEXT_PUBLIC_SUPABASE_ANON_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: env_or_empty("NEXT_PUBLIC_SUPABASE_URL")
                .trim_end_matches('/')
                .to_owned(),
            anon_key: env_or_empty("NEXT_PUBLIC_SUPABASE_ANON_KEY"),
        }
    }

    /// Both values present and not a build-time placeholder.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty() && !self.url.contains("placeholder")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub supabase: SupabaseConfig,
    /// Public app URL (`NEXT_PUBLIC_APP_URL`). Empty when unset.
    pub app_url: String,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    /// Signing secret of the Stripe webhook endpoint (`STRIPE_WEBHOOK_SECRET`).
    pub stripe_webhook_secret: Option<String>,
}

impl AppConfig {
    /// Build the process configuration.
    ///
    /// # Panics
    ///
    /// Panics if `PORT` is set but not a valid port number.
    #[must_use]
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .map_or(DEFAULT_PORT, |raw| raw.parse().expect("invalid PORT"));

        Self {
            port,
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            supabase: SupabaseConfig::from_env(),
            app_url: env_or_empty("NEXT_PUBLIC_APP_URL")
                .trim_end_matches('/')
                .to_owned(),
            cookie_secure: cookie_secure(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").ok().filter(|v| !v.is_empty()),
        }
    }
}

pub(crate) fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

/// `COOKIE_SECURE` wins when set; otherwise secure cookies in production.
fn cookie_secure() -> bool {
    if let Some(value) = env_bool("COOKIE_SECURE") {
        return value;
    }

    ["APP_ENV", "NODE_ENV"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .any(|v| is_production(&v))
}

pub(crate) fn is_production(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("production")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
