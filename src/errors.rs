// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("API request failed with status {status}: {body}")]
    ProviderError { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error during evaluation: {0}")]
    Evaluation(#[source] Box<EvalError>),

    #[error("Error testing model {model}: {source}")]
    ModelFailure {
        model: String,
        #[source]
        source: Box<EvalError>,
    },

    #[error("{}", unexpected_message(.0))]
    Unexpected(String),
}

impl EvalError {
    pub fn invalid(message: impl Into<String>) -> Self {
        EvalError::InvalidArgument(message.into())
    }

    /// Whether the failure was caused by the caller rather than downstream.
    pub fn is_client_error(&self) -> bool {
        matches!(self, EvalError::InvalidArgument(_))
    }
}

fn unexpected_message(message: &str) -> &str {
    if message.is_empty() {
        "An unexpected error occurred"
    } else {
        message
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
