use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Live Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::get_game,
        crate::routes::game::start_game,
        crate::routes::game::reveal_answer,
        crate::routes::game::advance_question,
        crate::routes::play::join_game,
        crate::routes::play::list_participants,
        crate::routes::play::select_team,
        crate::routes::play::game_questions,
        crate::routes::play::submit_answer,
        crate::routes::leaderboard::standings,
        crate::routes::leaderboard::export_standings,
        crate::routes::generation::generate_quiz_set,
        crate::routes::sse::game_events,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::GamePhaseSnapshot,
            crate::dto::game::GameSnapshot,
            crate::dto::game::TransitionResponse,
            crate::dto::game::JoinGameRequest,
            crate::dto::game::SelectTeamRequest,
            crate::dto::game::ParticipantSummary,
            crate::dto::game::QuestionView,
            crate::dto::game::ChoiceView,
            crate::dto::answer::SubmitAnswerRequest,
            crate::dto::answer::AnswerAck,
            crate::dto::leaderboard::StandingRow,
            crate::dto::leaderboard::TeamStandingRow,
            crate::dto::generation::GenerateQuizRequest,
            crate::dto::generation::GeneratedQuizSummary,
            crate::routes::game::RevealRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Host-side game lifecycle operations"),
        (name = "play", description = "Participant registration and play"),
        (name = "leaderboard", description = "Standings aggregation and export"),
        (name = "generation", description = "AI quiz generation"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
