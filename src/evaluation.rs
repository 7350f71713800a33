// src/evaluation.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EvalSettings, ModelSpec};
use crate::errors::{EvalError, Result};
use crate::providers::LlmProvider;
use crate::runner::{self, round2, RunResult};

/// Inclusive bounds for K and runs-per-model.
pub const MIN_RUNS: i64 = 1;
pub const MAX_RUNS: i64 = 10;

/// Pass@K summary for a single model.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EvaluationResult {
    pub pass_at_k: f64,
    pub average_latency: f64,
    /// Same value as `pass_at_k`, kept for clients that read either field
    pub success_rate: f64,
    pub total_runs: usize,
    pub runs: Vec<RunResult>,
}

/// One model's share of an A/B comparison.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelResult {
    pub model_name: String,
    pub average_latency: f64,
    pub success_rate: f64,
    pub average_tokens: f64,
    pub runs: Vec<RunResult>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ComparisonResult {
    pub models: Vec<ModelResult>,
}

/// Checks a run count against [MIN_RUNS, MAX_RUNS]; `field` names it in the error.
pub fn validate_runs(field: &str, runs: i64) -> Result<usize> {
    if !(MIN_RUNS..=MAX_RUNS).contains(&runs) {
        return Err(EvalError::invalid(format!(
            "{} must be between {} and {}",
            field, MIN_RUNS, MAX_RUNS
        )));
    }
    Ok(runs as usize)
}

pub fn validate_task(task: &str) -> Result<()> {
    if task.trim().is_empty() {
        return Err(EvalError::invalid("task cannot be empty"));
    }
    Ok(())
}

/// Mean of `values`, rounded to two decimals. Empty input yields 0.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

/// Percentage of successful runs, rounded to two decimals.
pub fn pass_rate(runs: &[RunResult]) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    let successful = runs.iter().filter(|r| r.success).count();
    round2(successful as f64 / runs.len() as f64 * 100.0)
}

/// Drives repeated provider calls and folds them into summary metrics.
///
/// All runs are strictly sequential; the only suspension points are the
/// provider calls and the configured pauses.
pub struct Evaluator<P> {
    provider: P,
    settings: EvalSettings,
}

impl<P: LlmProvider> Evaluator<P> {
    pub fn new(provider: P, settings: EvalSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs `task` K times against the default model and computes Pass@K.
    pub async fn evaluate(
        &self,
        task: &str,
        expected_output: Option<&str>,
        k: i64,
    ) -> Result<EvaluationResult> {
        let k = validate_runs("k", k)?;
        validate_task(task)?;

        let model = self.settings.default_model.as_str();
        log::info!("Starting Pass@{} evaluation on {}", k, model);

        // A missing expectation is checked as blank, which always passes.
        let runs = self
            .run_batch(model, task, Some(expected_output.unwrap_or("")), k)
            .await
            .map_err(|e| EvalError::Evaluation(Box::new(e)))?;

        let pass_at_k = pass_rate(&runs);
        let average_latency = mean(runs.iter().map(|r| r.latency_ms));

        log::info!(
            "Pass@{} on {}: {}% (avg latency {}ms)",
            k, model, pass_at_k, average_latency
        );

        Ok(EvaluationResult {
            pass_at_k,
            average_latency,
            success_rate: pass_at_k,
            total_runs: k,
            runs,
        })
    }

    /// Runs `task` against every comparison model in order, `runs_per_model` times each.
    pub async fn compare(&self, task: &str, runs_per_model: i64) -> Result<ComparisonResult> {
        let runs_per_model = validate_runs("runs_per_model", runs_per_model)?;
        validate_task(task)?;

        let lineup = &self.settings.comparison_models;
        let mut models = Vec::with_capacity(lineup.len());

        for (index, model) in lineup.iter().enumerate() {
            if index > 0 {
                pause(self.settings.model_delay()).await;
            }

            let result = self
                .compare_model(model, task, runs_per_model)
                .await
                .map_err(|e| EvalError::ModelFailure {
                    model: model.label.clone(),
                    source: Box::new(e),
                })?;
            models.push(result);
        }

        Ok(ComparisonResult { models })
    }

    async fn compare_model(
        &self,
        spec: &ModelSpec,
        task: &str,
        runs_per_model: usize,
    ) -> Result<ModelResult> {
        log::info!("Testing {} ({}) with {} runs", spec.label, spec.id, runs_per_model);

        // Comparison runs measure performance only; no success check applies.
        let runs = self.run_batch(&spec.id, task, None, runs_per_model).await?;

        let result = ModelResult {
            model_name: spec.label.clone(),
            average_latency: mean(runs.iter().map(|r| r.latency_ms)),
            success_rate: 100.0,
            average_tokens: mean(runs.iter().map(|r| r.token_count as f64)),
            runs,
        };

        log::info!(
            "{}: avg latency {}ms, avg tokens {}",
            result.model_name, result.average_latency, result.average_tokens
        );

        Ok(result)
    }

    /// Calls the provider `count` times in sequence, numbering runs from 1 and
    /// pausing between (not after) consecutive runs.
    async fn run_batch(
        &self,
        model: &str,
        task: &str,
        expected_output: Option<&str>,
        count: usize,
    ) -> Result<Vec<RunResult>> {
        let mut runs = Vec::with_capacity(count);

        for i in 0..count {
            let mut result = runner::run_once(&self.provider, model, task, expected_output)
                .await
                .inspect_err(|e| log::error!("Run {}/{} on {} failed: {}", i + 1, count, model, e))?;
            result.run_number = i + 1;
            log::debug!(
                "Run {}/{} on {}: {}ms, {} tokens, success={}",
                result.run_number, count, model, result.latency_ms, result.token_count, result.success
            );
            runs.push(result);

            if i + 1 < count {
                pause(self.settings.run_delay()).await;
            }
        }

        Ok(runs)
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
