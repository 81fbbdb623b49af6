use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::runner::SyncStrategy;
use crate::aggregator::team_stats;
use crate::config::JobSettings;
use crate::error::Result;
use crate::fetcher::{ApiClient, HttpTransport};
use crate::selector::{pending_team_stats, team_stats_path, Selection};
use crate::state::StoreHandle;
use crate::types::{TeamItem, TeamStatsSummary};

pub const JOB_NAME: &str = "team_stats";

/// Teams in upcoming fixtures with missing or stale stats → `team_stats/{team_id}`.
pub struct TeamStatsStrategy;

#[async_trait]
impl SyncStrategy for TeamStatsStrategy {
    type Item = TeamItem;
    type Record = TeamStatsSummary;

    fn job_name(&self) -> &'static str {
        JOB_NAME
    }

    async fn select(
        &self,
        store: &StoreHandle,
        now: DateTime<Utc>,
        settings: &JobSettings,
    ) -> Result<Selection<TeamItem>> {
        pending_team_stats(store, now, settings.window_days, settings.freshness_hours, settings.batch_cap).await
    }

    async fn derive<T: HttpTransport>(
        &self,
        client: &ApiClient<T>,
        item: &TeamItem,
        now: DateTime<Utc>,
    ) -> Result<TeamStatsSummary> {
        team_stats::derive(client, item, now).await
    }

    fn record_path(&self, item: &TeamItem) -> String {
        team_stats_path(item.team_id)
    }

    fn describe(&self, item: &TeamItem) -> String {
        match &item.name {
            Some(name) => format!("team {} ({name})", item.team_id),
            None => format!("team {}", item.team_id),
        }
    }
}
