//! Pulls upcoming scheduled matches into `matches/{date}`, the namespace
//! the other two jobs select from.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;

use super::runner::SyncStrategy;
use crate::config::JobSettings;
use crate::error::Result;
use crate::fetcher::models::{Match, TeamRef};
use crate::fetcher::{ApiClient, HttpTransport};
use crate::selector::{matches_path, Selection};
use crate::state::StoreHandle;
use crate::types::{FixtureTeam, ScheduledMatch};

pub const JOB_NAME: &str = "fixtures";

/// One item per day of the look-ahead window. Each day's subtree is
/// replaced wholesale so postponed fixtures drop out.
pub struct FixturesStrategy;

#[async_trait]
impl SyncStrategy for FixturesStrategy {
    type Item = NaiveDate;
    type Record = BTreeMap<String, ScheduledMatch>;

    fn job_name(&self) -> &'static str {
        JOB_NAME
    }

    async fn select(
        &self,
        _store: &StoreHandle,
        now: DateTime<Utc>,
        settings: &JobSettings,
    ) -> Result<Selection<NaiveDate>> {
        let today = now.date_naive();
        let days: Vec<NaiveDate> = (0..settings.window_days.max(0)).map(|d| today + Duration::days(d)).collect();
        Ok(Selection {
            total_pending: days.len(),
            items: days,
        })
    }

    async fn derive<T: HttpTransport>(
        &self,
        client: &ApiClient<T>,
        date: &NaiveDate,
        _now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, ScheduledMatch>> {
        let list = client.scheduled_matches(*date, *date).await?;
        let fetched = list.matches.len();
        let day: BTreeMap<String, ScheduledMatch> = list.matches.iter().filter_map(to_scheduled).collect();
        debug!("[FIXTURES] {date}: {} of {fetched} matches usable", day.len());
        Ok(day)
    }

    fn record_path(&self, date: &NaiveDate) -> String {
        matches_path(*date)
    }

    fn describe(&self, date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }
}

/// Matches without a kickoff time or either team id cannot be paired later.
fn to_scheduled(m: &Match) -> Option<(String, ScheduledMatch)> {
    let fixture = ScheduledMatch {
        utc_date: m.utc_date?,
        home_team: fixture_team(&m.home_team)?,
        away_team: fixture_team(&m.away_team)?,
        competition: m.competition.as_ref().and_then(|c| c.name.clone()),
        status: m.status.clone(),
    };
    Some((m.id.to_string(), fixture))
}

fn fixture_team(team: &TeamRef) -> Option<FixtureTeam> {
    Some(FixtureTeam {
        id: team.id?,
        name: team.name.clone().or_else(|| team.short_name.clone()),
    })
}
