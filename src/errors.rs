use thiserror::Error;

#[derive(Error, Debug)]
pub enum CamError {
    #[error("Connection Error: {0}")]
    Connection(String),

    #[error("Invalid State: {0}")]
    InvalidState(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Conflict Error: {0}")]
    Conflict(String),

    #[error("Transfer Error: {0}")]
    Transfer(String),

    #[error("Timeout Error: {0}")]
    Timeout(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Locked Error: {0}")]
    Locked(String),

    #[error("Capture Failed: {0}")]
    Capture(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl CamError {
    /// A session does not survive a connection-level failure; everything
    /// else is reported and leaves the session usable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CamError::Connection(_))
    }
}

// Allow conversion from std::io::Error; local file failures during
// download/stitch output handling count as transfer problems.
impl From<std::io::Error> for CamError {
    fn from(err: std::io::Error) -> Self {
        CamError::Transfer(err.to_string())
    }
}
