use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Where the generation prompt content comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Free-form topic description.
    Topic,
    /// Raw pasted text.
    Text,
    /// Content fetched from a URL by the generation service.
    Url,
    /// Pre-extracted PDF text.
    Pdf,
}

/// Requested difficulty of the generated questions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Easy questions.
    Easy,
    /// Medium questions.
    Medium,
    /// Hard questions.
    Hard,
}

/// Host request to generate a quiz set from source content.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct GenerateQuizRequest {
    /// Kind of source content.
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// The content itself (topic, text, URL, or extracted PDF text).
    #[validate(length(min = 1))]
    pub content: String,
    /// How many questions to generate, at most 10.
    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 10))]
    pub number_of_questions: u8,
    /// Requested difficulty; defaults to medium.
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
}

fn default_question_count() -> u8 {
    5
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

/// One generated question as returned by the generation service.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeneratedQuestion {
    /// Question text.
    pub body: String,
    /// Answer choices; a valid question carries exactly four.
    pub choices: Vec<GeneratedChoice>,
    /// Think time in seconds (10-30).
    pub time_limit: u32,
    /// Maximum score (500-2000).
    pub points: u32,
    /// Optional explanation of the correct answer.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// One generated choice.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeneratedChoice {
    /// Choice text.
    pub body: String,
    /// Whether this choice is marked correct.
    pub is_correct: bool,
}

/// Wire shape of the generation service response.
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Whether the upstream call succeeded.
    pub success: bool,
    /// The generated questions when `success` is true.
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
    /// Upstream error message when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

/// Result returned to the host once a generated set has been accepted.
#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedQuizSummary {
    /// Identifier of the freshly inserted quiz set.
    pub quiz_set_id: Uuid,
    /// Number of questions in the set.
    pub question_count: u32,
}
