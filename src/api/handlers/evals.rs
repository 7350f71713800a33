// src/api/handlers/evals.rs
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::errors::EvalError;

fn default_runs() -> i64 {
    3
}

#[derive(Clone, Deserialize)]
pub struct EvaluateRequest {
    pub task: String,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default = "default_runs")]
    pub k: i64,
}

#[derive(Clone, Deserialize)]
pub struct AbTestRequest {
    pub task: String,
    #[serde(default = "default_runs")]
    pub runs_per_model: i64,
}

fn log_failure(request_id: Uuid, operation: &str, e: &EvalError) {
    if e.is_client_error() {
        log::warn!("[{}] rejected: {}", request_id, e);
    } else {
        log::error!("[{}] {} failed: {}", request_id, operation, e);
    }
}

/// Pass@K for one task against the default model.
pub async fn evaluate(
    state: web::Data<AppState>,
    req: web::Json<EvaluateRequest>,
) -> Result<HttpResponse, EvalError> {
    let request_id = Uuid::new_v4();
    let req = req.into_inner();
    log::info!("[{}] evaluate: k={}", request_id, req.k);

    let result = state
        .evaluator
        .evaluate(&req.task, req.expected_output.as_deref(), req.k)
        .await
        .inspect_err(|e| log_failure(request_id, "evaluation", e))?;

    Ok(HttpResponse::Ok().json(result))
}

/// Compares the configured model lineup on one task.
pub async fn ab_test(
    state: web::Data<AppState>,
    req: web::Json<AbTestRequest>,
) -> Result<HttpResponse, EvalError> {
    let request_id = Uuid::new_v4();
    let req = req.into_inner();
    log::info!("[{}] ab-test: runs_per_model={}", request_id, req.runs_per_model);

    let result = state
        .evaluator
        .compare(&req.task, req.runs_per_model)
        .await
        .inspect_err(|e| log_failure(request_id, "comparison", e))?;

    Ok(HttpResponse::Ok().json(result))
}
