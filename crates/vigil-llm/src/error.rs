#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider {provider} failed: {reason}")]
    ProviderFailed { provider: String, reason: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("all providers failed (tried: {})", tried.join(", "))]
    AllProvidersFailed { tried: Vec<String> },

    #[error("invalid classification pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
