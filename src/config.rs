//! Runtime configuration loaded from `config.json`.
//!
//! The file is optional. Every field has a default, and a missing or
//! unreadable file only disables what needs it (the vision-model sources
//! when no API key is present). The resulting [`AppConfig`] is built once in
//! `main` and passed down explicitly.

use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::fetch::RetryPolicy;

fn default_vision_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_secs() -> u64 {
    2
}

fn default_pdf_dpi() -> u32 {
    200
}

/// Settings shared by every scraper in a run.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Hosted vision-model key; empty strings count as absent.
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    #[serde(default = "default_pdf_dpi")]
    pub pdf_dpi: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            vision_model: default_vision_model(),
            request_timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            pdf_dpi: default_pdf_dpi(),
        }
    }
}

impl AppConfig {
    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        Ok(config.normalized())
    }

    /// Parse `path` if it exists, falling back to defaults with a warning.
    #[instrument(level = "info", fields(path = %path.display()))]
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            warn!("Config file not found; using defaults (vision extraction disabled)");
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                info!(
                    has_api_key = config.gemini_api_key.is_some(),
                    model = %config.vision_model,
                    "Loaded configuration"
                );
                config
            }
            Err(e) => {
                warn!(error = %e, "Could not read config file; using defaults");
                Self::default()
            }
        }
    }

    /// Let a key from the command line or environment win over the file.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.gemini_api_key = Some(key);
        }
        self
    }

    fn normalized(mut self) -> Self {
        self.gemini_api_key = self.gemini_api_key.filter(|k| !k.trim().is_empty());
        self.max_attempts = self.max_attempts.max(1);
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.base_delay_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
