//! Shared application state and the pure phase state machine.

pub mod state_machine;

use std::sync::Arc;

use crate::{config::AppConfig, dao::game_store::GameStore};

/// Shared handle to the application state, cheap to clone.
pub type SharedState = Arc<AppState>;

/// Central application state: the injected storage backend, the immutable
/// runtime configuration, and the outbound HTTP client.
///
/// The store is constructed by the caller and passed in explicitly so tests
/// substitute their own backend behind the same trait.
pub struct AppState {
    store: Arc<dyn GameStore>,
    config: AppConfig,
    http: reqwest::Client,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    pub fn new(store: Arc<dyn GameStore>, config: AppConfig) -> SharedState {
        Arc::new(Self {
            store,
            config,
            http: reqwest::Client::new(),
        })
    }

    /// Handle to the storage backend.
    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Outbound HTTP client used for the quiz-generation service.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
