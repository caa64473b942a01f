use vigil_llm::LlmError;
use vigil_tools::{SessionError, ToolError};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("activation rejected: {0}")]
    ActivationRejected(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
