use std::sync::Arc;

use rand::seq::IndexedRandom;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{ParticipantEntity, QuestionEntity},
        storage::Constraint,
    },
    dto::game::JoinGameRequest,
    error::ServiceError,
    state::state_machine::GamePhase,
};

/// Avatars assigned at random when a joining device picks none.
const AVATARS: &[&str] = &[
    "cat", "dog", "fox", "owl", "bear", "frog", "koala", "panda", "tiger", "whale",
];

/// Register a device as a participant of a game.
///
/// Registration is idempotent per `(game_id, user_id)`: a duplicate join
/// resolves to the existing participant row instead of erroring, so a client
/// that retries (or re-opens the page) keeps its identity and its answers.
pub async fn join_game(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
    request: JoinGameRequest,
) -> Result<ParticipantEntity, ServiceError> {
    let Some(game) = store.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    };
    if game.phase.is_terminal() {
        return Err(ServiceError::InvalidState(
            "game has already finished".into(),
        ));
    }

    let avatar_id = request.avatar_id.unwrap_or_else(random_avatar);
    let participant = ParticipantEntity {
        id: Uuid::new_v4(),
        game_id,
        user_id: request.user_id,
        nickname: request.nickname,
        avatar_id,
        team_id: None,
        created_at: OffsetDateTime::now_utc(),
    };

    match store.insert_participant(participant.clone()).await {
        Ok(()) => {
            info!(game_id = %game_id, participant_id = %participant.id, "participant joined");
            Ok(participant)
        }
        Err(err) if err.is_conflict(Constraint::ParticipantPerGame) => {
            debug!(game_id = %game_id, user_id = %participant.user_id, "duplicate join resolved");
            let existing = store
                .find_participant_by_user(game_id, participant.user_id)
                .await?;
            existing.ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "participant for user `{}` in game `{game_id}`",
                    participant.user_id
                ))
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Assign (or clear) a participant's team slot while the game is in team mode.
pub async fn select_team(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
    participant_id: Uuid,
    team_id: Option<u8>,
) -> Result<(), ServiceError> {
    let Some(game) = store.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    };

    if !game.team_mode {
        return Err(ServiceError::InvalidState(
            "game does not run in team mode".into(),
        ));
    }

    if !matches!(game.phase, GamePhase::Lobby) {
        return Err(ServiceError::InvalidState(
            "teams can only be chosen in the lobby".into(),
        ));
    }

    if let Some(slot) = team_id
        && !(1..=game.max_teams).contains(&slot)
    {
        return Err(ServiceError::InvalidInput(format!(
            "team slot {slot} outside 1-{}",
            game.max_teams
        )));
    }

    store.set_participant_team(participant_id, team_id).await?;
    Ok(())
}

/// The full ordered question set of a game, fetched once per session.
pub async fn game_questions(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Vec<QuestionEntity>, ServiceError> {
    let Some(game) = store.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    };
    Ok(store.list_questions(game.quiz_set_id).await?)
}

fn random_avatar() -> String {
    let mut rng = rand::rng();
    AVATARS
        .choose(&mut rng)
        .copied()
        .unwrap_or("cat")
        .to_string()
}
