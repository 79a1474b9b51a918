// Application configuration, loaded from environment variables.

use std::time::Duration;

/// Default random.org endpoint returning one decimal fraction in plain text.
pub const DEFAULT_RANDOM_ORG_URL: &str =
    "https://www.random.org/decimal-fractions/?num=1&dec=2&col=1&format=plain&rnd=new";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Time-to-live for cached car records.
    pub cache_ttl: Duration,
    /// Endpoint of the external randomness service.
    pub random_org_url: String,
    /// Request timeout for the randomness service.
    pub random_timeout: Duration,
    /// Replace the network randomness source with a local seeded one.
    /// Off by default; the fairness guarantee of an external unbiased
    /// source only holds when this stays off.
    pub local_random: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:racing.db?mode=rwc`)
    /// - `TTL_SECONDS` - cache TTL in seconds (default: 60)
    /// - `RANDOM_ORG_URL` - randomness endpoint (default: random.org decimal fractions)
    /// - `RANDOM_TIMEOUT_MS` - randomness request timeout (default: 2000)
    /// - `LOCAL_RANDOM` - set to `true` or `1` to use a local PRNG instead
    pub fn load() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:racing.db?mode=rwc".to_string());

        let ttl_seconds: u64 = std::env::var("TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let random_org_url = std::env::var("RANDOM_ORG_URL")
            .unwrap_or_else(|_| DEFAULT_RANDOM_ORG_URL.to_string());

        let random_timeout_ms: u64 = std::env::var("RANDOM_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2000);

        let local_random = std::env::var("LOCAL_RANDOM")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Config {
            database_url,
            cache_ttl: Duration::from_secs(ttl_seconds),
            random_org_url,
            random_timeout: Duration::from_millis(random_timeout_ms),
            local_random,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite:racing.db?mode=rwc".to_string(),
            cache_ttl: Duration::from_secs(60),
            random_org_url: DEFAULT_RANDOM_ORG_URL.to_string(),
            random_timeout: Duration::from_millis(2000),
            local_random: false,
        }
    }
}
