use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid session request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Core(#[from] raydio_core::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
