// src/providers/mod.rs

use std::collections::BTreeMap;

use crate::errors::Result;

pub mod gemini;

/// What a provider hands back for one prompt, already normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Generated text, empty when the provider returned none
    pub text: String,
    /// Prompt tokens plus completion tokens
    pub token_count: u64,
    /// Safety category mapped to the reported severity
    pub safety_ratings: BTreeMap<String, String>,
}

/// A common trait for Large Language Model (LLM) providers.
///
/// Note: We're not using async_trait here, so implementers must handle async directly.
pub trait LlmProvider: Send + Sync {
    /// Generates a response for `prompt` with the given model identifier
    /// (e.g. "gemini-1.5-flash").
    fn generate(&self, model: &str, prompt: &str) -> impl std::future::Future<Output = Result<Generation>> + Send;
}
