use thiserror::Error;

/// One strategy's failure. Accumulated by the pipeline, never returned alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{strategy}: {reason}")]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: String,
}

impl StrategyFailure {
    pub fn new(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Not a recognizable post URL: {0}")]
    InvalidReference(String),

    #[error("All extraction strategies failed for {shortcode}: {}", .diagnostics.join("; "))]
    Exhausted {
        shortcode: String,
        diagnostics: Vec<String>,
    },
}

impl ExtractError {
    /// Human-readable diagnostics, joined.
    pub fn note(&self) -> String {
        match self {
            ExtractError::InvalidReference(url) => format!("unrecognized reference: {}", url),
            ExtractError::Exhausted { diagnostics, .. } => diagnostics.join("; "),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
