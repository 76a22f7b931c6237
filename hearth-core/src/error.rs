//! Error types for Hearth operations

/// Result type for Hearth operations
pub type Result<T> = std::result::Result<T, HearthError>;

/// Error types for the Hearth dialogue layer
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Text-response service failed (transport, HTTP status, empty choices)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Scene script is malformed or inconsistent
    #[error("Scene script error: {0}")]
    Script(String),

    /// No scene script registered under the id
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// Cast member referenced but not present
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Player action source closed before the scene finished
    #[error("Player input closed")]
    InputClosed,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for HearthError {
    fn from(s: String) -> Self {
        HearthError::Other(s)
    }
}

impl From<&str> for HearthError {
    fn from(s: &str) -> Self {
        HearthError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for HearthError {
    fn from(err: anyhow::Error) -> Self {
        HearthError::Other(err.to_string())
    }
}

impl From<figment::Error> for HearthError {
    fn from(err: figment::Error) -> Self {
        HearthError::Configuration(err.to_string())
    }
}
