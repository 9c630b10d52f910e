use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("{message}")]
    Rejected { message: String },

    #[error("Note '{0}' not found")]
    NotFound(Uuid),

    #[error("Invalid note: {0}")]
    Validation(String),

    #[error("Cache error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid service url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for NoteError {
    fn from(err: reqwest::Error) -> Self {
        NoteError::Network(Box::new(err))
    }
}

impl NoteError {
    pub fn rejected(message: impl Into<String>) -> Self {
        NoteError::Rejected {
            message: message.into(),
        }
    }

    /// Transport failures, as opposed to answers from the server.
    pub fn is_network(&self) -> bool {
        matches!(self, NoteError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, NoteError>;
