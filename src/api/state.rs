// src/api/state.rs
use crate::config::AppConfig;
use crate::evaluation::Evaluator;
use crate::providers::gemini::GeminiProvider;
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<Evaluator<GeminiProvider>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let provider = GeminiProvider::new(Client::new(), config.gemini);
        let evaluator = Evaluator::new(provider, config.settings);
        Self {
            evaluator: Arc::new(evaluator),
        }
    }
}
