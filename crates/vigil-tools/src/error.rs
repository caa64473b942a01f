#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("privilege mode already active for {remaining_secs} more seconds")]
    AlreadyActive { remaining_secs: u64 },

    #[error("invalid duration {secs}s (must be between 1 and 3600 seconds)")]
    InvalidDuration { secs: i64 },

    #[error("invalid activation keyword: {0}")]
    InvalidKeyword(String),

    #[error("custom activation keywords are disabled")]
    CustomKeywordDisabled,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("command blocked: matches dangerous pattern '{pattern}' and privilege mode is not active")]
    Blocked { pattern: String, command: String },

    #[error("invalid command: {0}")]
    Validation(String),

    #[error("{0} is disabled")]
    FeatureDisabled(&'static str),

    #[error("execution failed: {0}")]
    Execution(String),
}
