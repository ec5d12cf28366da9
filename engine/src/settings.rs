//! Per-request LLM settings
//!
//! Endpoint, model and API key can change while the service runs (operators
//! insert a new `configs` row). They are resolved once per request into an
//! immutable [`LlmSettings`] snapshot which is then passed explicitly to the
//! planner and the synthesizer.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::config::LLMConfig;
use crate::db::CommitStore;

/// Connection details for the completion service
#[derive(Clone, PartialEq)]
pub struct LlmSettings {
    pub completions_url: String,
    pub model: String,
    pub api_key: String,
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("completions_url", &self.completions_url)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

impl From<&LLMConfig> for LlmSettings {
    fn from(config: &LLMConfig) -> Self {
        Self {
            completions_url: config.completions_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key(),
        }
    }
}

/// Partial settings stored in the `configs` table; absent columns are `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredLlmSettings {
    pub completions_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Source of the settings snapshot for one request
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn resolve(&self) -> Result<LlmSettings>;
}

/// Settings fixed at startup from the configuration file
pub struct StaticSettings {
    settings: LlmSettings,
}

impl StaticSettings {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn resolve(&self) -> Result<LlmSettings> {
        Ok(self.settings.clone())
    }
}

/// Settings read from the most recent `configs` row, with file values as fallback
pub struct DatabaseSettings {
    store: Arc<dyn CommitStore>,
    fallback: LlmSettings,
}

impl DatabaseSettings {
    pub fn new(store: Arc<dyn CommitStore>, fallback: LlmSettings) -> Self {
        Self { store, fallback }
    }

    fn merge(stored: StoredLlmSettings, fallback: &LlmSettings) -> LlmSettings {
        let pick = |value: Option<String>, default: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        LlmSettings {
            completions_url: pick(stored.completions_url, &fallback.completions_url),
            model: pick(stored.model, &fallback.model),
            api_key: pick(stored.api_key, &fallback.api_key),
        }
    }
}

#[async_trait]
impl SettingsSource for DatabaseSettings {
    async fn resolve(&self) -> Result<LlmSettings> {
        match self.store.latest_llm_settings().await? {
            Some(stored) => Ok(Self::merge(stored, &self.fallback)),
            None => {
                tracing::debug!("No configs row found, using file settings");
                Ok(self.fallback.clone())
            }
        }
    }
}
