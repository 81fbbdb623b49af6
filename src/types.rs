use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scheduled matches (matches/{date}/{match_id})
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureTeam {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// A fixture as stored under the `matches` namespace. The map key is the match id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMatch {
    #[serde(alias = "utcDate")]
    pub utc_date: DateTime<Utc>,
    #[serde(alias = "homeTeam")]
    pub home_team: FixtureTeam,
    #[serde(alias = "awayTeam")]
    pub away_team: FixtureTeam,
    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Work items
// ---------------------------------------------------------------------------

/// One upcoming fixture whose head-to-head record is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPairing {
    pub match_id: String,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_team_name: Option<String>,
    pub away_team_name: Option<String>,
    pub scheduled_at: DateTime<Utc>,
}

/// One team whose stats are missing or stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamItem {
    pub team_id: i64,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Head-to-head summary (h2h/{match_id})
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    HomeAdvantage,
    AwayAdvantage,
    Neutral,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trend::HomeAdvantage => "HOME_ADVANTAGE",
            Trend::AwayAdvantage => "AWAY_ADVANTAGE",
            Trend::Neutral => "NEUTRAL",
        };
        write!(f, "{s}")
    }
}

/// A finished meeting between the two fixture teams, as it was actually played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct H2hMatch {
    pub date: DateTime<Utc>,
    pub home_team_id: i64,
    pub home_team: Option<String>,
    pub away_team_id: i64,
    pub away_team: Option<String>,
    pub home_score: u32,
    pub away_score: u32,
    pub competition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadSummary {
    pub match_id: String,
    pub home_team: TeamLabel,
    pub away_team: TeamLabel,
    pub total_matches: u32,
    pub home_wins: u32,
    pub away_wins: u32,
    pub draws: u32,
    pub home_goals: u32,
    pub away_goals: u32,
    pub recent_trend: Trend,
    /// Most recent first.
    pub matches: Vec<H2hMatch>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLabel {
    pub id: i64,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Team stats summary (team_stats/{team_id})
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl FormResult {
    pub fn from_goals(scored: u32, conceded: u32) -> Self {
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => FormResult::Win,
            std::cmp::Ordering::Equal => FormResult::Draw,
            std::cmp::Ordering::Less => FormResult::Loss,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormStats {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalsStats {
    pub scored: u32,
    pub conceded: u32,
    pub per_match_scored: f64,
    pub per_match_conceded: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaguePosition {
    pub competition: Option<String>,
    pub position: Option<u32>,
    pub played: Option<u32>,
    pub points: Option<i32>,
    pub won: Option<u32>,
    pub draw: Option<u32>,
    pub lost: Option<u32>,
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatsSummary {
    pub id: i64,
    pub name: Option<String>,
    pub country: Option<String>,
    /// Most recent first.
    pub form: Vec<FormResult>,
    pub form_stats: FormStats,
    pub goals_stats: GoalsStats,
    pub league_position: Option<LeaguePosition>,
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Health (health/{job_name}, health/system)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(RunStatus::Success),
            "error" => Ok(RunStatus::Error),
            other => Err(format!("unknown status '{other}', expected success or error")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub last_run: DateTime<Utc>,
    pub status: RunStatus,
    pub processed_count: u32,
    pub pending_count: u32,
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_started: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Healthy,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealthRecord {
    pub last_check: DateTime<Utc>,
    pub status: SystemStatus,
    pub issues: Vec<String>,
}
