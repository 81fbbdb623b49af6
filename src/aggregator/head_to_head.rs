use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{H2H_HISTORY_LIMIT, H2H_MATCH_WINDOW, H2H_TREND_WINDOW};
use crate::error::Result;
use crate::fetcher::models::Match;
use crate::fetcher::{ApiClient, HttpTransport};
use crate::types::{H2hMatch, HeadToHeadSummary, MatchPairing, TeamLabel, Trend};

/// Fetch the home team's finished history and summarize meetings with the away team.
/// Any fetch failure (404 included) fails the item so it stays pending.
pub async fn derive<T: HttpTransport>(
    client: &ApiClient<T>,
    item: &MatchPairing,
    now: DateTime<Utc>,
) -> Result<HeadToHeadSummary> {
    let history = client.finished_matches(item.home_team_id, H2H_HISTORY_LIMIT).await?;
    debug!(
        "[H2H] {}: {} finished matches in home team history",
        item.match_id,
        history.matches.len()
    );
    Ok(summarize(item, &history.matches, now))
}

/// Head-to-head summary of `item` from a finished-match history.
///
/// Wins and goals are attributed by team id to the *current* fixture's home and
/// away sides, not to the historical home/away roles.
pub fn summarize(item: &MatchPairing, history: &[Match], now: DateTime<Utc>) -> HeadToHeadSummary {
    let mut meetings: Vec<&Match> = history
        .iter()
        .filter(|m| is_meeting(m, item.home_team_id, item.away_team_id))
        .filter(|m| m.full_time().is_some() && m.utc_date.is_some())
        .collect();
    meetings.sort_by(|a, b| b.utc_date.cmp(&a.utc_date).then(b.id.cmp(&a.id)));
    meetings.dedup_by_key(|m| m.id);
    meetings.truncate(H2H_MATCH_WINDOW);

    let matches: Vec<H2hMatch> = meetings.iter().filter_map(|m| to_h2h_match(m)).collect();

    let mut home_wins = 0;
    let mut away_wins = 0;
    let mut draws = 0;
    let mut home_goals = 0;
    let mut away_goals = 0;

    for m in &matches {
        match winner_id(m) {
            Some(id) if id == item.home_team_id => home_wins += 1,
            Some(_) => away_wins += 1,
            None => draws += 1,
        }
        let (for_home, for_away) = goals_for_fixture(m, item.home_team_id);
        home_goals += for_home;
        away_goals += for_away;
    }

    HeadToHeadSummary {
        match_id: item.match_id.clone(),
        home_team: TeamLabel {
            id: item.home_team_id,
            name: item.home_team_name.clone().or_else(|| name_in(&matches, item.home_team_id)),
        },
        away_team: TeamLabel {
            id: item.away_team_id,
            name: item.away_team_name.clone().or_else(|| name_in(&matches, item.away_team_id)),
        },
        total_matches: matches.len() as u32,
        home_wins,
        away_wins,
        draws,
        home_goals,
        away_goals,
        recent_trend: recent_trend(&matches, item.home_team_id),
        matches,
        last_updated: now,
    }
}

/// Trend over the most recent meetings; `matches` must be most-recent-first.
pub fn recent_trend(matches: &[H2hMatch], home_team_id: i64) -> Trend {
    if matches.len() < H2H_TREND_WINDOW {
        return Trend::Neutral;
    }
    let (mut home, mut away) = (0, 0);
    for m in &matches[..H2H_TREND_WINDOW] {
        match winner_id(m) {
            Some(id) if id == home_team_id => home += 1,
            Some(_) => away += 1,
            None => {}
        }
    }
    if home >= 2 {
        Trend::HomeAdvantage
    } else if away >= 2 {
        Trend::AwayAdvantage
    } else {
        Trend::Neutral
    }
}

fn is_meeting(m: &Match, a: i64, b: i64) -> bool {
    matches!(m.team_ids(), Some((h, w)) if (h == a && w == b) || (h == b && w == a))
}

fn to_h2h_match(m: &Match) -> Option<H2hMatch> {
    let (home_team_id, away_team_id) = m.team_ids()?;
    let (home_score, away_score) = m.full_time()?;
    Some(H2hMatch {
        date: m.utc_date?,
        home_team_id,
        home_team: m.home_team.name.clone(),
        away_team_id,
        away_team: m.away_team.name.clone(),
        home_score,
        away_score,
        competition: m.competition.as_ref().and_then(|c| c.name.clone()),
    })
}

fn winner_id(m: &H2hMatch) -> Option<i64> {
    match m.home_score.cmp(&m.away_score) {
        std::cmp::Ordering::Greater => Some(m.home_team_id),
        std::cmp::Ordering::Less => Some(m.away_team_id),
        std::cmp::Ordering::Equal => None,
    }
}

/// (goals by fixture home side, goals by fixture away side)
fn goals_for_fixture(m: &H2hMatch, fixture_home_id: i64) -> (u32, u32) {
    if m.home_team_id == fixture_home_id {
        (m.home_score, m.away_score)
    } else {
        (m.away_score, m.home_score)
    }
}

fn name_in(matches: &[H2hMatch], team_id: i64) -> Option<String> {
    matches.iter().find_map(|m| {
        if m.home_team_id == team_id {
            m.home_team.clone()
        } else if m.away_team_id == team_id {
            m.away_team.clone()
        } else {
            None
        }
    })
}
