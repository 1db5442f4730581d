//! Application-level configuration: timing knobs and the quiz-generation
//! service endpoint.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_LIVE_BACK_CONFIG_PATH";

/// Scoring window between choice reveal and a zero-point answer.
const DEFAULT_ANSWER_WINDOW_MS: u32 = 20_000;
/// Countdown shown before the choices become visible to players.
const DEFAULT_CHOICE_REVEAL_DELAY_MS: u32 = 5_000;
/// Pause between an answer reveal and the automatic question advance.
const DEFAULT_AUTO_ADVANCE_DELAY_MS: u64 = 8_000;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Reveal-to-answer scoring window in milliseconds. Distinct from a
    /// question's authored `time_limit`.
    pub answer_window_ms: u32,
    /// Delay before choices are shown, in milliseconds.
    pub choice_reveal_delay_ms: u32,
    /// Delay used by timer-driven question advance, in milliseconds.
    pub auto_advance_delay_ms: u64,
    /// Quiz-generation service endpoint; generation routes 503 when absent.
    pub generation: Option<GenerationConfig>,
}

/// Connection details for the external quiz-generation service.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Endpoint receiving the generation request.
    pub url: String,
    /// Optional bearer token sent with each request.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in
    /// defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            answer_window_ms: DEFAULT_ANSWER_WINDOW_MS,
            choice_reveal_delay_ms: DEFAULT_CHOICE_REVEAL_DELAY_MS,
            auto_advance_delay_ms: DEFAULT_AUTO_ADVANCE_DELAY_MS,
            generation: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file.
struct RawConfig {
    #[serde(default)]
    answer_window_ms: Option<u32>,
    #[serde(default)]
    choice_reveal_delay_ms: Option<u32>,
    #[serde(default)]
    auto_advance_delay_ms: Option<u64>,
    #[serde(default)]
    generation: Option<GenerationConfig>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            answer_window_ms: raw.answer_window_ms.unwrap_or(defaults.answer_window_ms),
            choice_reveal_delay_ms: raw
                .choice_reveal_delay_ms
                .unwrap_or(defaults.choice_reveal_delay_ms),
            auto_advance_delay_ms: raw
                .auto_advance_delay_ms
                .unwrap_or(defaults.auto_advance_delay_ms),
            generation: raw.generation,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
