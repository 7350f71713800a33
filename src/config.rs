// src/config.rs
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::errors::{EvalError, Result};

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: String,
}

/// One entry of the A/B lineup: the provider model id and the label shown to users.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub id: String,
    pub label: String,
}

impl ModelSpec {
    pub fn new(id: &str, label: &str) -> Self {
        Self { id: id.to_string(), label: label.to_string() }
    }
}

/// Tunables for the evaluation workflows, optionally loaded from a TOML file.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EvalSettings {
    /// Model used by the single-model Pass@K evaluation
    pub default_model: String,

    /// Pause between consecutive runs of the same model
    pub run_delay_ms: u64,

    /// Pause between two models of a comparison
    pub model_delay_ms: u64,

    /// Models compared by the A/B workflow, in evaluation order (fast, balanced, quality)
    pub comparison_models: Vec<ModelSpec>,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            default_model: "gemini-1.5-flash".to_string(),
            run_delay_ms: 500,
            model_delay_ms: 1000,
            comparison_models: vec![
                ModelSpec::new("gemini-1.5-flash-8b", "Gemini 1.5 Flash 8B (Fast)"),
                ModelSpec::new("gemini-1.5-flash", "Gemini 1.5 Flash (Balanced)"),
                ModelSpec::new("gemini-1.5-pro", "Gemini 1.5 Pro (Quality)"),
            ],
        }
    }
}

impl EvalSettings {
    pub const COMPARISON_MODEL_COUNT: usize = 3;

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: EvalSettings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Settings with no pauses, handy for tests and local scripting.
    pub fn without_delays() -> Self {
        Self { run_delay_ms: 0, model_delay_ms: 0, ..Self::default() }
    }

    pub fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }

    pub fn model_delay(&self) -> Duration {
        Duration::from_millis(self.model_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.default_model.trim().is_empty() {
            return Err(EvalError::Config("default_model cannot be empty".to_string()));
        }
        if self.comparison_models.len() != Self::COMPARISON_MODEL_COUNT {
            return Err(EvalError::Config(format!(
                "comparison_models must list exactly {} models (fast, balanced, quality), got {}",
                Self::COMPARISON_MODEL_COUNT,
                self.comparison_models.len()
            )));
        }
        Ok(())
    }
}

/// High-level application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub settings: EvalSettings,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                EvalError::MissingCredential(
                    "GEMINI_API_KEY environment variable is required".to_string(),
                )
            })?;
        let api_base = lookup("GEMINI_API_BASE")
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());

        let host = lookup("EVAL_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("EVAL_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| EvalError::Config(format!("invalid EVAL_PORT '{}': {}", raw, e)))?,
            None => 8000,
        };

        let settings = match lookup("EVAL_CONFIG") {
            Some(path) => EvalSettings::from_file(&path)?,
            None => EvalSettings::default(),
        };

        Ok(AppConfig {
            gemini: GeminiConfig { api_base, api_key },
            settings,
            host,
            port,
        })
    }
}
