use serde::Serialize;
use utoipa::ToSchema;

/// Body of the `/healthcheck` probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the storage backend answers, `degraded` when it does not.
    pub status: &'static str,
}

impl HealthResponse {
    /// The storage backend answered the probe.
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    /// The storage backend did not answer the probe.
    pub fn degraded() -> Self {
        Self { status: "degraded" }
    }
}
