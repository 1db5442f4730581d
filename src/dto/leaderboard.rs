use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One participant's row in the computed standings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StandingRow {
    /// 1-based rank after sorting.
    pub rank: u32,
    /// Participant identifier.
    pub participant_id: Uuid,
    /// Display name.
    pub nickname: String,
    /// Avatar identifier.
    pub avatar_id: String,
    /// Team slot, if any.
    pub team_id: Option<u8>,
    /// Number of correctly answered questions.
    pub correct_count: u32,
    /// Total questions in the quiz set.
    pub total_questions: u32,
    /// Sum of all answer scores.
    pub total_score: u64,
}

/// One team's row in the team-mode standings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamStandingRow {
    /// 1-based rank after sorting.
    pub rank: u32,
    /// 1-based team slot.
    pub team_id: u8,
    /// Number of participants on the team.
    pub member_count: u32,
    /// Combined score of all members.
    pub total_score: u64,
}
