//! Typed views over the sports API payloads.
//!
//! Only identities are required; every other field is optional so a payload
//! with gaps still parses and the gaps surface as `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Missing key and explicit `null` both yield the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreLine {
    #[serde(default)]
    pub home: Option<u32>,
    #[serde(default)]
    pub away: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default)]
    pub full_time: Option<ScoreLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompetitionRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: i64,
    #[serde(default)]
    pub utc_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub home_team: TeamRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub away_team: TeamRef,
    #[serde(default)]
    pub score: Option<Score>,
    #[serde(default)]
    pub competition: Option<CompetitionRef>,
}

impl Match {
    /// Final score when both sides are present.
    pub fn full_time(&self) -> Option<(u32, u32)> {
        let line = self.score.as_ref()?.full_time.as_ref()?;
        Some((line.home?, line.away?))
    }

    pub fn team_ids(&self) -> Option<(i64, i64)> {
        Some((self.home_team.id?, self.away_team.id?))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Area {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfile {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub area: Option<Area>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub running_competitions: Vec<CompetitionRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: TeamRef,
    #[serde(default)]
    pub played_games: Option<u32>,
    #[serde(default)]
    pub won: Option<u32>,
    #[serde(default)]
    pub draw: Option<u32>,
    #[serde(default)]
    pub lost: Option<u32>,
    #[serde(default)]
    pub points: Option<i32>,
    #[serde(default)]
    pub goals_for: Option<u32>,
    #[serde(default)]
    pub goals_against: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandingGroup {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub table: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandingsResponse {
    #[serde(default)]
    pub competition: Option<CompetitionRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub standings: Vec<StandingGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn match_with_partial_score_has_no_full_time() {
        let m: Match = serde_json::from_value(json!({
            "id": 1,
            "utcDate": "2026-09-01T18:00:00Z",
            "homeTeam": {"id": 10, "name": "A"},
            "awayTeam": {"id": 20, "name": "B"},
            "score": {"fullTime": {"home": 2, "away": null}}
        }))
        .unwrap();
        assert_eq!(m.full_time(), None);
        assert_eq!(m.team_ids(), Some((10, 20)));
    }

    #[test]
    fn team_profile_tolerates_missing_fields() {
        let t: TeamProfile = serde_json::from_value(json!({"id": 10})).unwrap();
        assert!(t.name.is_none());
        assert!(t.running_competitions.is_empty());
    }

    #[test]
    fn explicit_nulls_read_as_empty() {
        let t: TeamProfile = serde_json::from_value(json!({
            "id": 10, "name": null, "area": null, "runningCompetitions": null
        }))
        .unwrap();
        assert!(t.running_competitions.is_empty());

        let list: MatchList = serde_json::from_value(json!({"matches": [
            {"id": 1, "homeTeam": null, "awayTeam": {"id": 20}, "score": null, "competition": null}
        ]}))
        .unwrap();
        assert_eq!(list.matches[0].home_team.id, None);
        assert_eq!(list.matches[0].team_ids(), None);
        let empty: MatchList = serde_json::from_value(json!({"matches": null})).unwrap();
        assert!(empty.matches.is_empty());

        let s: StandingsResponse = serde_json::from_value(json!({
            "standings": [{"type": "TOTAL", "table": null}, {"table": [{"position": 1, "team": null}]}]
        }))
        .unwrap();
        assert!(s.standings[0].table.is_empty());
        assert_eq!(s.standings[1].table[0].team.id, None);
        let none: StandingsResponse = serde_json::from_value(json!({"standings": null})).unwrap();
        assert!(none.standings.is_empty());
    }

    #[test]
    fn standings_rows_parse() {
        let s: StandingsResponse = serde_json::from_value(json!({
            "standings": [{"type": "TOTAL", "table": [
                {"position": 3, "team": {"id": 10}, "playedGames": 8, "points": 17,
                 "won": 5, "draw": 2, "lost": 1, "goalsFor": 14, "goalsAgainst": 6}
            ]}]
        }))
        .unwrap();
        let row = &s.standings[0].table[0];
        assert_eq!(row.position, Some(3));
        assert_eq!(row.goals_against, Some(6));
        assert_eq!(s.standings[0].kind.as_deref(), Some("TOTAL"));
    }
}
