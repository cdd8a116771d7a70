use thiserror::Error;

/// Errors raised by the driver loops and their configuration.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("step count must be {expected}, got {got}")]
    InvalidStepCount { got: i64, expected: &'static str },

    #[error("space error: {0}")]
    Space(String),

    #[error("off-policy step evaluation is enabled but no evaluation env was supplied")]
    MissingEvalEnv,

    #[error("failed to save checkpoint for episode {episode}: {source}")]
    Checkpoint {
        episode: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("configuration error for {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoopError>;
