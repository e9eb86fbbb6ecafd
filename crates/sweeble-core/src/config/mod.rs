use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{endpoints, limits, models, paths, timing};
use crate::error::SweebleError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub timing: TimingSettings,
    pub context: ContextSettings,
    pub edits: EditSettings,
    pub filter: FilterSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// Stored key. Wins over the environment variable when non-blank.
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub base_url: String,
    pub completion_model: String,
    pub classification_model: String,
    pub completion_max_tokens: u32,
    pub proposal_max_tokens: u32,
    pub completion_temperature: f32,
    pub proposal_temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub debounce_ms: u64,
    pub classification_timeout_ms: u64,
    pub completion_timeout_ms: u64,
    pub proposal_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Characters captured on each side of the cursor.
    pub window_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSettings {
    /// Proposed edits below this confidence are dropped before display.
    pub min_confidence: f64,
    pub typo_tolerance: usize,
    /// Let a local syntax-error hint upgrade a simple insertion to a complex edit.
    pub trust_local_hints: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub respect_gitignore: bool,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: endpoints::API_KEY_ENV.to_string(),
            base_url: endpoints::OPENAI_BASE_URL.to_string(),
            completion_model: models::COMPLETION_MODEL.to_string(),
            classification_model: models::CLASSIFICATION_MODEL.to_string(),
            completion_max_tokens: limits::COMPLETION_MAX_TOKENS,
            proposal_max_tokens: limits::PROPOSAL_MAX_TOKENS,
            completion_temperature: limits::COMPLETION_TEMPERATURE,
            proposal_temperature: limits::PROPOSAL_TEMPERATURE,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            debounce_ms: timing::DEBOUNCE_MS,
            classification_timeout_ms: timing::CLASSIFICATION_TIMEOUT_MS,
            completion_timeout_ms: timing::COMPLETION_TIMEOUT_MS,
            proposal_timeout_ms: timing::PROPOSAL_TIMEOUT_MS,
        }
    }
}

impl TimingSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn classification_timeout(&self) -> Duration {
        Duration::from_millis(self.classification_timeout_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    pub fn proposal_timeout(&self) -> Duration {
        Duration::from_millis(self.proposal_timeout_ms)
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            window_chars: limits::CONTEXT_WINDOW_CHARS,
        }
    }
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            typo_tolerance: limits::TYPO_TOLERANCE,
            trust_local_hints: true,
        }
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    /// Load from the default location, falling back to defaults on any problem.
    pub fn load() -> Self {
        match Self::load_from(&Self::config_path()) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SweebleError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SweebleError::Config(e.to_string()))
    }

    pub fn save(&self) -> Result<(), SweebleError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SweebleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| SweebleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Stored key first, then the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        if let Some(key) = self.openai.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        std::env::var(&self.openai.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}
