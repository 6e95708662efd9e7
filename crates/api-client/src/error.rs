use thiserror::Error;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    /// The body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
