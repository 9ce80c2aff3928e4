use crate::errors::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Tour products every live query asks for.
pub const TOUR_KEYS: [&str; 2] = ["24h-grupos", "arena"];
/// Months covered by a live query.
pub const QUERY_MONTHS: u32 = 6;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_BANNER_TTL_SECS: u64 = 5;
const DEFAULT_REFRESH_DELAY_SECS: u64 = 180;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub port: u16,
    pub backend_url: String,
    /// How long a banner stays visible.
    pub banner_ttl: Duration,
    /// Wait between triggering the remote refresh job and reloading from cache.
    pub refresh_reload_delay: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            banner_ttl: Duration::from_secs(DEFAULT_BANNER_TTL_SECS),
            refresh_reload_delay: Duration::from_secs(DEFAULT_REFRESH_DELAY_SECS),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let backend_url = lookup("DASHBOARD_BACKEND_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.backend_url);

        Ok(Self {
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            backend_url,
            banner_ttl: parse_var(&lookup, "DASHBOARD_BANNER_TTL_SECS")?
                .map_or(defaults.banner_ttl, Duration::from_secs),
            refresh_reload_delay: parse_var(&lookup, "DASHBOARD_REFRESH_DELAY_SECS")?
                .map_or(defaults.refresh_reload_delay, Duration::from_secs),
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
