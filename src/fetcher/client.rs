use chrono::NaiveDate;
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::latency::LatencyStats;
use super::models::{MatchList, StandingsResponse, TeamProfile};
use super::transport::{HttpTransport, ReqwestTransport};
use crate::config::{Config, RetryPolicy, AUTH_HEADER, USER_AGENTS};
use crate::error::{AppError, Result};

/// Sports API client: bounded retries, backoff on transport failures,
/// cool-down on 429, and a fixed pause after every call.
pub struct ApiClient<T = ReqwestTransport> {
    base_url: String,
    api_key: String,
    transport: T,
    policy: RetryPolicy,
    latency: LatencyStats,
}

impl ApiClient<ReqwestTransport> {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_key = cfg.require_api_key()?.to_string();
        Ok(Self::with_transport(
            &cfg.api_url,
            &api_key,
            ReqwestTransport::new()?,
            RetryPolicy::default(),
        ))
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn with_transport(base_url: &str, api_key: &str, transport: T, policy: RetryPolicy) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            transport,
            policy,
            latency: LatencyStats::new(),
        }
    }

    pub fn latency(&self) -> &LatencyStats {
        &self.latency
    }

    pub fn log_latency(&self) {
        let (p50, p95, p99) = self.latency.percentiles();
        info!(
            samples = self.latency.len(),
            "[API] latency p50={}ms p95={}ms p99={}ms",
            fmt_ms(p50),
            fmt_ms(p95),
            fmt_ms(p99),
        );
    }

    /// GET `endpoint` and decode the JSON body. 404 surfaces as `AppError::NotFound`.
    pub async fn request(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let query: Vec<(String, String)> = query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

        let outcome = self.request_with_retries(endpoint, &url, &query).await;
        sleep(self.policy.inter_request_delay).await;
        outcome
    }

    pub async fn request_as<D: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<D> {
        let value = self.request(endpoint, query).await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::Upstream(format!("unexpected payload from {endpoint}: {e}")))
    }

    pub async fn team(&self, team_id: i64) -> Result<TeamProfile> {
        self.request_as(&format!("teams/{team_id}"), &[]).await
    }

    pub async fn finished_matches(&self, team_id: i64, limit: u32) -> Result<MatchList> {
        self.request_as(
            &format!("teams/{team_id}/matches"),
            &[("status", "FINISHED".to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn standings(&self, competition_id: i64) -> Result<StandingsResponse> {
        self.request_as(&format!("competitions/{competition_id}/standings"), &[]).await
    }

    /// Scheduled matches with `from <= date <= to`.
    pub async fn scheduled_matches(&self, from: NaiveDate, to: NaiveDate) -> Result<MatchList> {
        self.request_as(
            "matches",
            &[
                ("dateFrom", from.format("%Y-%m-%d").to_string()),
                ("dateTo", to.format("%Y-%m-%d").to_string()),
                ("status", "SCHEDULED,TIMED".to_string()),
            ],
        )
        .await
    }

    async fn request_with_retries(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(String, String)],
    ) -> Result<Value> {
        let mut attempt = 0u32;
        let mut cooldowns = 0u32;

        loop {
            let headers = self.headers();
            let started = Instant::now();

            match self.transport.get(url, query, &headers).await {
                Ok(resp) => {
                    self.latency.record(started.elapsed());
                    match resp.status {
                        200..=299 => {
                            debug!("[API] {endpoint} → {}", resp.status);
                            if resp.body.trim().is_empty() {
                                return Ok(Value::Null);
                            }
                            return serde_json::from_str(&resp.body).map_err(|e| {
                                AppError::Upstream(format!("invalid JSON from {endpoint}: {e}"))
                            });
                        }
                        429 => {
                            cooldowns += 1;
                            warn!(
                                "[API] rate limited on {endpoint}, cooling down {}s ({cooldowns}/{})",
                                self.policy.rate_limit_cooldown.as_secs(),
                                self.policy.max_attempts,
                            );
                            sleep(self.policy.rate_limit_cooldown).await;
                            if cooldowns >= self.policy.max_attempts {
                                return Err(AppError::RateLimited(format!(
                                    "{endpoint}: still rate limited after {cooldowns} cool-downs"
                                )));
                            }
                        }
                        404 => {
                            debug!("[API] {endpoint} → 404");
                            return Err(AppError::NotFound(endpoint.to_string()));
                        }
                        status => {
                            warn!("[API] {endpoint} failed: status={status} body={}", truncate(&resp.body, 200));
                            return Err(AppError::Upstream(format!("{endpoint}: status {status}")));
                        }
                    }
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.policy.max_attempts {
                        warn!("[API] {endpoint} giving up after {attempt} attempts: {e}");
                        return Err(AppError::Transient(format!("{endpoint}: {e}")));
                    }
                    let delay = self.policy.backoff_for(attempt - 1);
                    warn!(
                        "[API] {endpoint} attempt {attempt}/{} failed: {e}; retrying in {}s",
                        self.policy.max_attempts,
                        delay.as_secs(),
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("fixture-sync");
        vec![
            (AUTH_HEADER, self.api_key.clone()),
            ("User-Agent", agent.to_string()),
        ]
    }
}

fn fmt_ms(v: Option<u64>) -> String {
    v.map(|ms| ms.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
