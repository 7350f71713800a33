// src/runner.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::errors::Result;
use crate::providers::LlmProvider;

/// Format used for run timestamps, sortable as plain text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one provider call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RunResult {
    pub run_number: usize,
    pub response_text: String,
    pub latency_ms: f64,
    pub token_count: u64,
    pub safety_ratings: BTreeMap<String, String>,
    pub success: bool,
    pub timestamp: String,
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Case-insensitive substring check. A blank expectation means no check was
/// requested and always succeeds.
pub fn check_success(response_text: &str, expected_output: &str) -> bool {
    if expected_output.trim().is_empty() {
        return true;
    }
    response_text
        .to_lowercase()
        .contains(&expected_output.to_lowercase())
}

/// Performs exactly one generation call and normalizes it into a `RunResult`.
///
/// `run_number` is left at 0; the caller numbers runs within its batch.
/// With `expected_output` set to `None` the run is unconditionally successful.
pub async fn run_once<P: LlmProvider>(
    provider: &P,
    model: &str,
    task: &str,
    expected_output: Option<&str>,
) -> Result<RunResult> {
    let start = Instant::now();
    let generation = provider.generate(model, task).await?;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let success = expected_output
        .map(|expected| check_success(&generation.text, expected))
        .unwrap_or(true);

    Ok(RunResult {
        run_number: 0,
        response_text: generation.text,
        latency_ms: round2(latency_ms),
        token_count: generation.token_count,
        safety_ratings: generation.safety_ratings,
        success,
        timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
    })
}
