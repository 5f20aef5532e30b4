use crate::http::TransportError;

/// Why a backend or asset request did not produce a usable payload. The
/// `Display` text is what ends up inside a failure notice.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Malformed(String),
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("HTTP {0}")]
    Status(u16),
}

impl Failure {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } | Self::Status(status) => Some(*status),
            Self::Transport(_) | Self::Malformed(_) => None,
        }
    }
}

impl From<TransportError> for Failure {
    fn from(error: TransportError) -> Self {
        Self::Transport(error.0)
    }
}
