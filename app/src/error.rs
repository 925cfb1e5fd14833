use riego_core::error::ModelError;
use std::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Did not found {0}: {1}")]
    NotFound(&'static str, i32),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Response without data")]
    MissingData,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid session file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Arguments are not used as specified: {0}")]
    ArgumentError(&'static str),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub enum ConsoleError {
    User(Box<dyn error::Error + Send + Sync>),
    Internal(Box<dyn error::Error + Send + Sync>),
}

impl ConsoleError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ConsoleError::User(err) => err.is::<StoreError>(),
            ConsoleError::Internal(_) => false,
        }
    }
}

impl From<ModelError> for ConsoleError {
    fn from(err: ModelError) -> Self {
        ConsoleError::User(Box::from(err))
    }
}

impl From<StoreError> for ConsoleError {
    fn from(err: StoreError) -> Self {
        ConsoleError::User(Box::from(err))
    }
}

impl From<ApiError> for ConsoleError {
    fn from(err: ApiError) -> Self {
        ConsoleError::User(Box::from(err))
    }
}

impl From<BackendError> for ConsoleError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(_) => ConsoleError::User(Box::from(err)),
            BackendError::Server { status, .. } if status < 500 => {
                ConsoleError::User(Box::from(err))
            }
            _ => ConsoleError::Internal(Box::from(err)),
        }
    }
}

impl From<SessionError> for ConsoleError {
    fn from(err: SessionError) -> Self {
        ConsoleError::Internal(Box::from(err))
    }
}

impl From<tokio::task::JoinError> for ConsoleError {
    fn from(err: tokio::task::JoinError) -> Self {
        ConsoleError::Internal(Box::from(err))
    }
}
