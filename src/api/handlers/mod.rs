// src/api/handlers/mod.rs
mod evals;
mod health;

pub use evals::{ab_test, evaluate, AbTestRequest, EvaluateRequest};
pub use health::{health_check, root};
