use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::game_store::GameStore,
    dto::leaderboard::{StandingRow, TeamStandingRow},
    error::ServiceError,
};

/// Compute the ranked individual standings of a game, on demand.
///
/// This is a snapshot over the raw answer set, not an incrementally
/// maintained total: callers re-fetch after each reveal. Ties on total score
/// break by earliest participant registration, then by id, so the ordering
/// is fully deterministic.
pub async fn compute_standings(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Vec<StandingRow>, ServiceError> {
    let Some(game) = store.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    };

    let mut participants = store.list_participants(game_id).await?;
    let questions = store.list_questions(game.quiz_set_id).await?;
    let answers = store.list_answers(game_id).await?;

    let correct_choices: HashSet<Uuid> = questions
        .iter()
        .filter_map(|q| q.correct_choice().map(|c| c.id))
        .collect();

    let mut totals: HashMap<Uuid, (u64, u32)> = HashMap::new();
    for answer in &answers {
        let entry = totals.entry(answer.participant_id).or_default();
        entry.0 += u64::from(answer.score);
        if correct_choices.contains(&answer.choice_id) {
            entry.1 += 1;
        }
    }

    // list_participants is already ordered by (created_at, id); a stable sort
    // on the score alone therefore yields the documented tie-break.
    participants.sort_by_key(|p| {
        let (total, _) = totals.get(&p.id).copied().unwrap_or_default();
        std::cmp::Reverse(total)
    });

    let total_questions = questions.len() as u32;
    Ok(participants
        .into_iter()
        .enumerate()
        .map(|(index, participant)| {
            let (total_score, correct_count) =
                totals.get(&participant.id).copied().unwrap_or_default();
            StandingRow {
                rank: index as u32 + 1,
                participant_id: participant.id,
                nickname: participant.nickname,
                avatar_id: participant.avatar_id,
                team_id: participant.team_id,
                correct_count,
                total_questions,
                total_score,
            }
        })
        .collect())
}

/// Aggregate the individual standings into team standings.
///
/// Participants without a team slot are skipped; both views derive from the
/// same answer set. Ties break by the lower team slot.
pub async fn compute_team_standings(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Vec<TeamStandingRow>, ServiceError> {
    let standings = compute_standings(store, game_id).await?;

    let mut teams: IndexMap<u8, (u32, u64)> = IndexMap::new();
    for row in &standings {
        let Some(team_id) = row.team_id else { continue };
        let entry = teams.entry(team_id).or_default();
        entry.0 += 1;
        entry.1 += row.total_score;
    }

    let mut rows: Vec<(u8, u32, u64)> = teams
        .into_iter()
        .map(|(team_id, (members, total))| (team_id, members, total))
        .collect();
    rows.sort_by_key(|(team_id, _, total)| (std::cmp::Reverse(*total), *team_id));

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(index, (team_id, member_count, total_score))| TeamStandingRow {
            rank: index as u32 + 1,
            team_id,
            member_count,
            total_score,
        })
        .collect())
}

/// Serialize standings to a delimited text export, one row per participant:
/// `rank,nickname,correct/total,total_score`.
pub fn to_csv(standings: &[StandingRow]) -> String {
    let mut out = String::from("rank,nickname,correct,total_score\n");
    for row in standings {
        out.push_str(&format!(
            "{},{},{}/{},{}\n",
            row.rank,
            escape_csv_field(&row.nickname),
            row.correct_count,
            row.total_questions,
            row.total_score
        ));
    }
    out
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
