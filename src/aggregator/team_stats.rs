use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::round2;
use crate::config::{FORM_WINDOW, TEAM_HISTORY_LIMIT};
use crate::error::Result;
use crate::fetcher::models::{Match, StandingsResponse, TableRow, TeamProfile};
use crate::fetcher::{ApiClient, HttpTransport};
use crate::types::{FormResult, FormStats, GoalsStats, LeaguePosition, TeamItem, TeamStatsSummary};

/// Recent form of one team: results most-recent-first plus the tallies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSummary {
    pub form: Vec<FormResult>,
    pub form_stats: FormStats,
    pub goals_stats: GoalsStats,
}

/// Profile, recent form and league position for one team.
///
/// The profile is required; a missing match history counts as "no matches",
/// and standings are best effort per competition.
pub async fn derive<T: HttpTransport>(
    client: &ApiClient<T>,
    item: &TeamItem,
    now: DateTime<Utc>,
) -> Result<TeamStatsSummary> {
    let profile = client.team(item.team_id).await?;

    let history = match client.finished_matches(item.team_id, TEAM_HISTORY_LIMIT).await {
        Ok(list) => list.matches,
        Err(e) if e.is_not_found() => {
            debug!("[TEAM] {}: no finished matches", item.team_id);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let mut league_position = None;
    for competition in &profile.running_competitions {
        let Some(competition_id) = competition.id else { continue };
        match client.standings(competition_id).await {
            Ok(standings) => {
                league_position = find_position(item.team_id, competition.name.as_deref(), &standings);
                if league_position.is_some() {
                    break;
                }
            }
            Err(e) if e.is_not_found() => {
                debug!("[TEAM] {}: no standings for competition {competition_id}", item.team_id);
            }
            Err(e) => {
                warn!("[TEAM] {}: standings for competition {competition_id} failed: {e}", item.team_id);
            }
        }
    }

    Ok(summarize(item, &profile, &history, league_position, now))
}

pub fn summarize(
    item: &TeamItem,
    profile: &TeamProfile,
    history: &[Match],
    league_position: Option<LeaguePosition>,
    now: DateTime<Utc>,
) -> TeamStatsSummary {
    let form = summarize_form(item.team_id, history);
    TeamStatsSummary {
        id: item.team_id,
        name: profile.name.clone().or_else(|| item.name.clone()),
        country: profile.area.as_ref().and_then(|a| a.name.clone()),
        form: form.form,
        form_stats: form.form_stats,
        goals_stats: form.goals_stats,
        league_position,
        last_updated: now,
    }
}

/// Form over the five most recent finished matches. A match counts only when
/// both final scores are present.
pub fn summarize_form(team_id: i64, history: &[Match]) -> FormSummary {
    let mut recent: Vec<&Match> = history.iter().collect();
    // Undated matches sort last.
    recent.sort_by(|a, b| b.utc_date.cmp(&a.utc_date).then(b.id.cmp(&a.id)));
    recent.truncate(FORM_WINDOW);

    let mut summary = FormSummary::default();
    for m in recent {
        let Some((home, away)) = m.full_time() else { continue };
        let (scored, conceded) = if m.home_team.id == Some(team_id) {
            (home, away)
        } else if m.away_team.id == Some(team_id) {
            (away, home)
        } else {
            continue;
        };

        let result = FormResult::from_goals(scored, conceded);
        match result {
            FormResult::Win => summary.form_stats.wins += 1,
            FormResult::Draw => summary.form_stats.draws += 1,
            FormResult::Loss => summary.form_stats.losses += 1,
        }
        summary.form.push(result);
        summary.goals_stats.scored += scored;
        summary.goals_stats.conceded += conceded;
    }

    let divisor = summary.form.len().max(1) as f64;
    summary.goals_stats.per_match_scored = round2(summary.goals_stats.scored as f64 / divisor);
    summary.goals_stats.per_match_conceded = round2(summary.goals_stats.conceded as f64 / divisor);
    summary
}

/// Row for `team_id` in a standings payload. Total tables are searched first.
pub fn find_position(
    team_id: i64,
    competition: Option<&str>,
    standings: &StandingsResponse,
) -> Option<LeaguePosition> {
    let is_total = |kind: &Option<String>| kind.as_deref().map_or(true, |k| k.eq_ignore_ascii_case("TOTAL"));
    let groups = standings
        .standings
        .iter()
        .filter(|g| is_total(&g.kind))
        .chain(standings.standings.iter().filter(|g| !is_total(&g.kind)));

    // A row with no figures would be stored as an empty object and read back as absent.
    let row = groups
        .flat_map(|g| g.table.iter())
        .find(|row| row.team.id == Some(team_id) && has_figures(row))?;

    Some(LeaguePosition {
        competition: competition
            .map(str::to_string)
            .or_else(|| standings.competition.as_ref().and_then(|c| c.name.clone())),
        position: row.position,
        played: row.played_games,
        points: row.points,
        won: row.won,
        draw: row.draw,
        lost: row.lost,
        goals_for: row.goals_for,
        goals_against: row.goals_against,
    })
}

fn has_figures(row: &TableRow) -> bool {
    row.position.is_some()
        || row.played_games.is_some()
        || row.points.is_some()
        || row.won.is_some()
        || row.draw.is_some()
        || row.lost.is_some()
        || row.goals_for.is_some()
        || row.goals_against.is_some()
}
