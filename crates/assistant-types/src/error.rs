use thiserror::Error;

/// Shown when a failure carries no reason of its own.
pub const GENERIC_FAILURE: &str = "Something went wrong.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// Rejected before any gateway was called.
    #[error("{0}")]
    Validation(String),

    /// An external service failed; the payload is its human-readable reason.
    #[error("{0}")]
    Gateway(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),

    #[error("Cancelled")]
    Cancelled,
}

impl AssistantError {
    /// Text posted as an Error-role message.
    pub fn user_message(&self) -> String {
        let text = match self {
            AssistantError::Validation(reason)
            | AssistantError::Gateway(reason)
            | AssistantError::Unsupported(reason) => reason.trim().to_string(),
            other => other.to_string(),
        };
        if text.is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            text
        }
    }
}

impl From<serde_json::Error> for AssistantError {
    fn from(e: serde_json::Error) -> Self {
        AssistantError::Serialization(e.to_string())
    }
}
