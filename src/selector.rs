//! Work selection: which fixtures and teams need a refresh this run.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::state::StoreHandle;
use crate::types::{MatchPairing, ScheduledMatch, TeamItem};

pub const MATCHES_ROOT: &str = "matches";
pub const H2H_ROOT: &str = "h2h";
pub const TEAM_STATS_ROOT: &str = "team_stats";

/// Capped work list plus how much was pending before the cap.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<T> {
    pub items: Vec<T>,
    pub total_pending: usize,
}

impl<T> Selection<T> {
    fn capped(mut items: Vec<T>, cap: usize) -> Self {
        let total_pending = items.len();
        items.truncate(cap);
        Self { items, total_pending }
    }
}

pub fn matches_path(date: NaiveDate) -> String {
    format!("{MATCHES_ROOT}/{}", date.format("%Y-%m-%d"))
}

pub fn h2h_path(match_id: &str) -> String {
    StoreHandle::child(H2H_ROOT, match_id)
}

pub fn team_stats_path(team_id: i64) -> String {
    format!("{TEAM_STATS_ROOT}/{team_id}")
}

/// Fixtures stored for dates in `[today, today + window_days)`, keyed by match id.
pub async fn scheduled_in_window(
    store: &StoreHandle,
    today: NaiveDate,
    window_days: i64,
) -> Result<Vec<(String, ScheduledMatch)>> {
    let mut fixtures = Vec::new();
    for offset in 0..window_days.max(0) {
        let date = today + Duration::days(offset);
        let Some(Value::Object(day)) = store.get(&matches_path(date)).await? else {
            continue;
        };
        for (match_id, raw) in day {
            match serde_json::from_value::<ScheduledMatch>(raw) {
                Ok(fixture) => fixtures.push((match_id, fixture)),
                Err(e) => warn!("[SELECT] skipping malformed fixture {date}/{match_id}: {e}"),
            }
        }
    }
    Ok(fixtures)
}

/// Fixtures in the window without a head-to-head record, soonest first.
///
/// A head-to-head record never goes stale: existence alone gates the refetch.
pub async fn pending_head_to_head(
    store: &StoreHandle,
    now: DateTime<Utc>,
    window_days: i64,
    batch_cap: usize,
) -> Result<Selection<MatchPairing>> {
    let fixtures = scheduled_in_window(store, now.date_naive(), window_days).await?;

    let mut seen = HashSet::new();
    let mut pending = Vec::new();
    for (match_id, fixture) in fixtures {
        if !seen.insert(match_id.clone()) {
            continue;
        }
        if store.exists(&h2h_path(&match_id)).await? {
            continue;
        }
        pending.push(MatchPairing {
            match_id,
            home_team_id: fixture.home_team.id,
            away_team_id: fixture.away_team.id,
            home_team_name: fixture.home_team.name,
            away_team_name: fixture.away_team.name,
            scheduled_at: fixture.utc_date,
        });
    }

    pending.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then_with(|| a.match_id.cmp(&b.match_id)));
    debug!("[SELECT] {} fixtures without head-to-head", pending.len());
    Ok(Selection::capped(pending, batch_cap))
}

/// Teams playing in the window whose stats are missing or older than `freshness_hours`.
pub async fn pending_team_stats(
    store: &StoreHandle,
    now: DateTime<Utc>,
    window_days: i64,
    freshness_hours: i64,
    batch_cap: usize,
) -> Result<Selection<TeamItem>> {
    let fixtures = scheduled_in_window(store, now.date_naive(), window_days).await?;

    let mut teams: BTreeMap<i64, Option<String>> = BTreeMap::new();
    for (_, fixture) in fixtures {
        for side in [fixture.home_team, fixture.away_team] {
            let name = teams.entry(side.id).or_default();
            if name.is_none() {
                *name = side.name;
            }
        }
    }

    let mut pending = Vec::new();
    for (team_id, name) in teams {
        let record = store.get(&team_stats_path(team_id)).await?;
        if is_stale(record.as_ref(), now, freshness_hours) {
            pending.push(TeamItem { team_id, name });
        }
    }

    debug!("[SELECT] {} teams with missing or stale stats", pending.len());
    Ok(Selection::capped(pending, batch_cap))
}

/// Missing records, records without a parseable `last_updated`, and records
/// older than the freshness window are stale.
pub fn is_stale(record: Option<&Value>, now: DateTime<Utc>, freshness_hours: i64) -> bool {
    let Some(last_updated) = record
        .and_then(|r| r.get("last_updated"))
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    else {
        return true;
    };
    now.signed_duration_since(last_updated.with_timezone(&Utc)) > Duration::hours(freshness_hours)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    pub(crate) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    pub(crate) async fn seed_fixture(store: &StoreHandle, date: &str, id: &str, hour: u32, home: i64, away: i64) {
        store
            .set(
                &format!("matches/{date}/{id}"),
                &json!({
                    "utc_date": format!("{date}T{hour:02}:00:00Z"),
                    "home_team": {"id": home, "name": format!("Team {home}")},
                    "away_team": {"id": away, "name": format!("Team {away}")},
                }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn window_is_half_open() {
        let store = StoreHandle::in_memory();
        seed_fixture(&store, "2026-10-18", "past", 12, 1, 2).await;
        seed_fixture(&store, "2026-10-19", "today", 12, 1, 2).await;
        seed_fixture(&store, "2026-10-21", "day2", 12, 3, 4).await;
        seed_fixture(&store, "2026-10-22", "day3", 12, 5, 6).await;

        let fixtures = scheduled_in_window(&store, now().date_naive(), 3).await.unwrap();
        let mut ids: Vec<_> = fixtures.into_iter().map(|(id, _)| id).collect();
        ids.sort();
        assert_eq!(ids, vec!["day2", "today"]);
    }

    #[tokio::test]
    async fn head_to_head_skips_existing_and_orders_by_kickoff() {
        let store = StoreHandle::in_memory();
        seed_fixture(&store, "2026-10-20", "late", 20, 1, 2).await;
        seed_fixture(&store, "2026-10-20", "early", 13, 3, 4).await;
        seed_fixture(&store, "2026-10-19", "done", 18, 5, 6).await;
        seed_fixture(&store, "2026-10-21", "next", 9, 7, 8).await;
        store.set("h2h/done", &json!({"total_matches": 0})).await.unwrap();

        let sel = pending_head_to_head(&store, now(), 3, 5).await.unwrap();
        let ids: Vec<_> = sel.items.iter().map(|i| i.match_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late", "next"]);
        assert_eq!(sel.total_pending, 3);
    }

    #[tokio::test]
    async fn head_to_head_caps_batch() {
        let store = StoreHandle::in_memory();
        for i in 0..7 {
            seed_fixture(&store, "2026-10-20", &format!("m{i}"), 10 + i, i as i64 * 2, i as i64 * 2 + 1).await;
        }
        let sel = pending_head_to_head(&store, now(), 3, 5).await.unwrap();
        assert_eq!(sel.items.len(), 5);
        assert_eq!(sel.total_pending, 7);
        assert_eq!(sel.items[0].match_id, "m0");
    }

    #[tokio::test]
    async fn team_stats_dedupes_and_applies_freshness() {
        let store = StoreHandle::in_memory();
        seed_fixture(&store, "2026-10-19", "a", 15, 10, 20).await;
        seed_fixture(&store, "2026-10-20", "b", 15, 20, 30).await;
        store
            .set("team_stats/10", &json!({"id": 10, "last_updated": "2026-10-19T06:00:00Z"}))
            .await
            .unwrap();
        store
            .set("team_stats/20", &json!({"id": 20, "last_updated": "2026-10-18T06:00:00Z"}))
            .await
            .unwrap();

        let sel = pending_team_stats(&store, now(), 3, 12, 10).await.unwrap();
        let ids: Vec<_> = sel.items.iter().map(|t| t.team_id).collect();
        // 10 is 6h old (fresh), 20 is 30h old (stale), 30 has no record.
        assert_eq!(ids, vec![20, 30]);
        assert_eq!(sel.items[1].name.as_deref(), Some("Team 30"));
    }

    #[tokio::test]
    async fn malformed_fixtures_are_skipped() {
        let store = StoreHandle::in_memory();
        seed_fixture(&store, "2026-10-19", "ok", 15, 10, 20).await;
        store.set("matches/2026-10-19/bad", &json!({"home_team": "?"})).await.unwrap();
        let sel = pending_head_to_head(&store, now(), 3, 5).await.unwrap();
        assert_eq!(sel.items.len(), 1);
    }

    #[test]
    fn staleness_gate() {
        let fresh = json!({"last_updated": "2026-10-19T01:00:00+00:00"});
        let old = json!({"last_updated": "2026-10-18T23:59:00Z"});
        let garbage = json!({"last_updated": "yesterday"});
        assert!(!is_stale(Some(&fresh), now(), 12));
        assert!(is_stale(Some(&old), now(), 12));
        assert!(is_stale(Some(&garbage), now(), 12));
        assert!(is_stale(None, now(), 12));
    }
}
