use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::runner::SyncStrategy;
use crate::aggregator::head_to_head;
use crate::config::JobSettings;
use crate::error::Result;
use crate::fetcher::{ApiClient, HttpTransport};
use crate::selector::{h2h_path, pending_head_to_head, Selection};
use crate::state::StoreHandle;
use crate::types::{HeadToHeadSummary, MatchPairing};

pub const JOB_NAME: &str = "h2h";

/// Upcoming fixtures without a head-to-head record → `h2h/{match_id}`.
pub struct HeadToHeadStrategy;

#[async_trait]
impl SyncStrategy for HeadToHeadStrategy {
    type Item = MatchPairing;
    type Record = HeadToHeadSummary;

    fn job_name(&self) -> &'static str {
        JOB_NAME
    }

    async fn select(
        &self,
        store: &StoreHandle,
        now: DateTime<Utc>,
        settings: &JobSettings,
    ) -> Result<Selection<MatchPairing>> {
        pending_head_to_head(store, now, settings.window_days, settings.batch_cap).await
    }

    async fn derive<T: HttpTransport>(
        &self,
        client: &ApiClient<T>,
        item: &MatchPairing,
        now: DateTime<Utc>,
    ) -> Result<HeadToHeadSummary> {
        head_to_head::derive(client, item, now).await
    }

    fn record_path(&self, item: &MatchPairing) -> String {
        h2h_path(&item.match_id)
    }

    fn describe(&self, item: &MatchPairing) -> String {
        format!("match {} ({} vs {})", item.match_id, item.home_team_id, item.away_team_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::head_to_head::tests::finished;
    use crate::fetcher::client::tests::ScriptedTransport;
    use crate::fetcher::HttpResponse;
    use crate::jobs::runner::{JobRunner, RunReport};
    use crate::selector::tests::{now, seed_fixture};
    use serde_json::json;

    fn history(matches: Vec<serde_json::Value>) -> Result<HttpResponse> {
        Ok(HttpResponse::new(200, &json!({ "matches": matches }).to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn writes_summary_for_each_pending_fixture() {
        let store = StoreHandle::in_memory();
        seed_fixture(&store, "2026-10-20", "m1", 19, 10, 20).await;
        seed_fixture(&store, "2026-10-21", "m2", 19, 30, 40).await;

        let transport = ScriptedTransport::new(vec![
            history(vec![
                finished(1, 30, 10, 20, Some(2), Some(0)),
                finished(2, 20, 20, 10, Some(1), Some(3)),
                finished(3, 10, 20, 10, Some(1), Some(0)),
                finished(4, 5, 10, 99, Some(5), Some(0)),
            ]),
            Ok(HttpResponse::new(404, "")),
        ]);
        let api = ApiClient::with_transport("https://api.example.com", "k", transport, Default::default());

        let report = JobRunner::new(HeadToHeadStrategy, &api, &store, JobSettings::head_to_head())
            .run_at(now())
            .await
            .unwrap();

        assert_eq!(report, RunReport { selected: 2, total_pending: 2, processed: 1, failed: 1 });

        let summary: HeadToHeadSummary = store.get_as("h2h/m1").await.unwrap().unwrap();
        assert_eq!(summary.total_matches, 3);
        assert_eq!(summary.home_wins, 2);
        assert_eq!(summary.away_wins, 1);
        assert_eq!(summary.recent_trend.to_string(), "HOME_ADVANTAGE");
        // 404 on history leaves m2 pending for the next run.
        assert!(!store.exists("h2h/m2").await.unwrap());

        let again = pending_head_to_head(&store, now(), 3, 5).await.unwrap();
        let ids: Vec<_> = again.items.iter().map(|p| p.match_id.as_str()).collect();
        assert_eq!(ids, vec!["m2"]);
    }
}
