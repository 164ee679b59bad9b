use thiserror::Error;

/// Failure at the generative-AI boundary
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI service returned no content")]
    EmptyResponse,

    #[error("could not parse AI response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AI service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed caller-supplied parameters
    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    ExternalService(#[from] ServiceError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True when the failure came from the AI boundary and retrying the action may help
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ExternalService(_))
    }
}
