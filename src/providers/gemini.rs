// src/providers/gemini.rs

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::GeminiConfig;
use crate::errors::{EvalError, Result};
use crate::providers::{Generation, LlmProvider};

/// A provider for interacting with Google's Gemini models.
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider`.
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }
}

/// Body of a `generateContent` reply. Every field falls back to its default
/// on its own when missing, `null` or of the wrong type, so one odd field
/// never costs the rest of the reply.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateContentResponse {
    #[serde(deserialize_with = "lenient_seq")]
    pub candidates: Vec<Candidate>,
    #[serde(deserialize_with = "lenient")]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Candidate {
    #[serde(deserialize_with = "lenient")]
    pub content: Option<Content>,
    #[serde(deserialize_with = "lenient_seq")]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Content {
    #[serde(deserialize_with = "lenient_seq")]
    pub parts: Vec<Part>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Part {
    #[serde(deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SafetyRating {
    #[serde(deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub probability: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageMetadata {
    #[serde(deserialize_with = "lenient")]
    pub prompt_token_count: u64,
    #[serde(deserialize_with = "lenient")]
    pub candidates_token_count: u64,
}

/// Reads any JSON value and keeps it only if it fits `T`.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Like `lenient`, but element by element, so a bad entry does not shift
/// the position of the good ones.
fn lenient_seq<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

impl GenerateContentResponse {
    /// Interprets a raw JSON reply. Anything other than an object yields an
    /// empty response.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("Unrecognized Gemini response shape, treating as empty: {}", e);
            Self::default()
        })
    }

    /// Text of the first part of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.clone())
            .unwrap_or_default()
    }

    pub fn safety_ratings(&self) -> BTreeMap<String, String> {
        self.candidates
            .first()
            .map(|c| {
                c.safety_ratings
                    .iter()
                    .filter_map(|r| {
                        let category = r.category.clone()?;
                        Some((category, r.probability.clone().unwrap_or_default()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn token_count(&self) -> u64 {
        self.usage_metadata
            .as_ref()
            .map(|u| u.prompt_token_count + u.candidates_token_count)
            .unwrap_or(0)
    }

    pub fn into_generation(self) -> Generation {
        Generation {
            text: self.text(),
            token_count: self.token_count(),
            safety_ratings: self.safety_ratings(),
        }
    }
}

impl LlmProvider for GeminiProvider {
    /// Calls the Gemini API with a given prompt and returns the normalized generation.
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            model
        );

        log::debug!("Calling Gemini: {} with model: {}", url, model);

        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        log::debug!("Gemini response status: {} ({}ms)", status, start.elapsed().as_millis());

        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(EvalError::ProviderError {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let raw = resp.text().await?;
        let response_json: Value = serde_json::from_str(&raw).map_err(|e| {
            EvalError::Unexpected(format!("Could not decode Gemini response: {}", e))
        })?;

        Ok(GenerateContentResponse::from_value(response_json).into_generation())
    }
}
