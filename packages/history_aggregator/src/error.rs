//! Error types and stable error codes.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// The history no longer accepts navigation or new listeners.
    #[error("history closed")]
    Closed,

    #[error("history backend error: {0}")]
    Backend(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HistoryError {
    pub fn error_code(&self) -> &str {
        match self {
            Self::Closed => "history_closed",
            Self::Backend(_) => "backend_error",
            Self::Config(_) => "invalid_config",
        }
    }
}
