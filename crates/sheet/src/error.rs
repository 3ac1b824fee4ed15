use thiserror::Error;

/// Errors raised by the table store and its backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Sheet not found: {name}")]
    MissingSheet { name: String },

    #[error("Backing store returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("No ids left to allocate in sheet {sheet}")]
    IdSpaceExhausted { sheet: &'static str },

    #[error("Invalid service account key: {0}")]
    InvalidKey(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
