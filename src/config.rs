use std::time::Duration;

use crate::error::{AppError, Result};

pub const SPORTS_API_URL: &str = "https://api.football-data.org/v4";

/// Header carrying the static API token.
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Pool of request identities rotated per call. Purely cosmetic.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Max transport-level attempts per request.
pub const MAX_ATTEMPTS: u32 = 3;

/// Exponential backoff base: delay = BASE * 2^attempt.
pub const BACKOFF_BASE_SECS: u64 = 2;

/// Cool-down after an HTTP 429.
pub const RATE_LIMIT_COOLDOWN_SECS: u64 = 60;

/// Delay after every completed API call, success or not.
pub const INTER_REQUEST_DELAY_SECS: u64 = 2;

/// Delay between two work items of one job run.
pub const INTER_ITEM_DELAY_SECS: u64 = 3;

/// HTTP timeout for a single request.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Lookahead window for scheduled matches, in days from today.
pub const LOOKAHEAD_DAYS: i64 = 3;

/// Team stats older than this are re-derived.
pub const TEAM_STATS_FRESHNESS_HOURS: i64 = 12;

pub const H2H_BATCH_CAP: usize = 5;
pub const TEAM_STATS_BATCH_CAP: usize = 10;

/// Finished matches fetched for head-to-head filtering.
pub const H2H_HISTORY_LIMIT: u32 = 100;
/// Finished matches fetched for team form.
pub const TEAM_HISTORY_LIMIT: u32 = 10;

pub const H2H_MATCH_WINDOW: usize = 10;
pub const H2H_TREND_WINDOW: usize = 3;
pub const FORM_WINDOW: usize = 5;

/// Username shown on monitor notifications.
pub const NOTIFY_USERNAME: &str = "Fixture Sync Monitor";

/// Default per-job freshness thresholds for the monitor (hours).
pub const DEFAULT_MONITOR_JOBS: &[(&str, i64)] = &[("fixtures", 26), ("h2h", 26), ("team_stats", 14)];

/// Retry and pacing knobs of the API client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub rate_limit_cooldown: Duration,
    pub inter_request_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(BACKOFF_BASE_SECS),
            rate_limit_cooldown: Duration::from_secs(RATE_LIMIT_COOLDOWN_SECS),
            inter_request_delay: Duration::from_secs(INTER_REQUEST_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Selection and pacing knobs of one job run.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub window_days: i64,
    pub freshness_hours: i64,
    pub batch_cap: usize,
    pub inter_item_delay: Duration,
}

impl JobSettings {
    pub fn head_to_head() -> Self {
        Self {
            window_days: LOOKAHEAD_DAYS,
            freshness_hours: TEAM_STATS_FRESHNESS_HOURS,
            batch_cap: H2H_BATCH_CAP,
            inter_item_delay: Duration::from_secs(INTER_ITEM_DELAY_SECS),
        }
    }

    pub fn team_stats() -> Self {
        Self {
            batch_cap: TEAM_STATS_BATCH_CAP,
            ..Self::head_to_head()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// SPORTS_API_KEY; required only by jobs that call the API.
    pub api_key: Option<String>,
    pub api_url: String,
    /// STORE_URL; scheme picks the backend (`memory:`, `sqlite:`, `http(s)://`).
    pub store_url: String,
    /// STORE_CREDENTIALS (inline) or the contents of STORE_CREDENTIALS_PATH.
    pub store_credential: Option<String>,
    pub webhook_url: Option<String>,
    pub log_level: String,
    pub status_api_port: u16,
    /// MONITOR_JOBS, e.g. "h2h:24,team_stats:12"
    pub monitor_jobs: Vec<(String, i64)>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store_url = non_empty_var("STORE_URL")
            .ok_or_else(|| AppError::Config("STORE_URL must be set".to_string()))?;

        let store_credential = match non_empty_var("STORE_CREDENTIALS") {
            Some(inline) => Some(inline),
            None => match non_empty_var("STORE_CREDENTIALS_PATH") {
                Some(path) => Some(std::fs::read_to_string(&path).map_err(|e| {
                    AppError::Config(format!("cannot read STORE_CREDENTIALS_PATH {path}: {e}"))
                })?),
                None => None,
            },
        };

        let monitor_jobs = match non_empty_var("MONITOR_JOBS") {
            Some(raw) => parse_monitor_jobs(&raw)?,
            None => DEFAULT_MONITOR_JOBS
                .iter()
                .map(|(name, hours)| (name.to_string(), *hours))
                .collect(),
        };

        Ok(Self {
            api_key: non_empty_var("SPORTS_API_KEY"),
            api_url: std::env::var("SPORTS_API_URL").unwrap_or_else(|_| SPORTS_API_URL.to_string()),
            store_url,
            store_credential,
            webhook_url: non_empty_var("ALERT_WEBHOOK_URL"),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            status_api_port: std::env::var("STATUS_API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("STATUS_API_PORT must be a valid port number".to_string()))?,
            monitor_jobs,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("SPORTS_API_KEY must be set".to_string()))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `name:hours,name:hours`.
pub fn parse_monitor_jobs(raw: &str) -> Result<Vec<(String, i64)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (name, hours) = entry
                .split_once(':')
                .ok_or_else(|| AppError::Config(format!("MONITOR_JOBS entry '{entry}' must be name:hours")))?;
            let hours = hours
                .trim()
                .parse::<i64>()
                .map_err(|_| AppError::Config(format!("MONITOR_JOBS hours for '{name}' must be an integer")))?;
            Ok((name.trim().to_string(), hours))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(0), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(8));
    }

    #[test]
    fn monitor_jobs_parse() {
        let jobs = parse_monitor_jobs("h2h:24, team_stats:12").unwrap();
        assert_eq!(jobs, vec![("h2h".to_string(), 24), ("team_stats".to_string(), 12)]);
    }

    #[test]
    fn monitor_jobs_reject_missing_hours() {
        assert!(parse_monitor_jobs("h2h").is_err());
        assert!(parse_monitor_jobs("h2h:soon").is_err());
    }

    #[test]
    fn team_stats_settings_raise_the_cap() {
        assert_eq!(JobSettings::head_to_head().batch_cap, 5);
        assert_eq!(JobSettings::team_stats().batch_cap, 10);
        assert_eq!(JobSettings::team_stats().freshness_hours, 12);
    }
}
