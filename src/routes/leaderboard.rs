//! Standings routes, including CSV export.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    dto::leaderboard::StandingRow,
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Aggregation axis for the standings query.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StandingsQuery {
    /// Set to `team` to aggregate per team instead of per participant.
    #[serde(default)]
    pub by: Option<String>,
}

/// Routes serving computed standings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{id}/standings", get(standings))
        .route("/games/{id}/standings/export", get(export_standings))
}

#[utoipa::path(
    get,
    path = "/games/{id}/standings",
    tag = "leaderboard",
    params(("id" = Uuid, Path, description = "Game identifier"), StandingsQuery),
    responses((status = 200, description = "Ranked standings", body = [StandingRow]))
)]
/// Compute standings on demand from the answer rows.
pub async fn standings(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StandingsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if query.by.as_deref() == Some("team") {
        let teams = leaderboard_service::compute_team_standings(state.store(), id).await?;
        return Ok(Json(json!(teams)));
    }
    let rows = leaderboard_service::compute_standings(state.store(), id).await?;
    Ok(Json(json!(rows)))
}

#[utoipa::path(
    get,
    path = "/games/{id}/standings/export",
    tag = "leaderboard",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Standings as CSV", content_type = "text/csv"))
)]
/// Export the per-participant standings as a CSV attachment.
pub async fn export_standings(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rows = leaderboard_service::compute_standings(state.store(), id).await?;
    let csv = leaderboard_service::to_csv(&rows);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"standings-{id}.csv\""),
            ),
        ],
        csv,
    ))
}
