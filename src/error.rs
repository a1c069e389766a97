use thiserror::Error;

/// Failure of one remote lookup, as surfaced in `SearchState::error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("{message}")]
    Network {
        message: String,
        status: Option<u16>,
    },
    #[error("{0}")]
    Decode(String),
}

impl SearchError {
    pub fn status(label: &str, code: u16) -> Self {
        Self::Network {
            message: format!("{label} failed with status {code}"),
            status: Some(code),
        }
    }

    pub fn transport(label: &str, err: &reqwest::Error) -> Self {
        Self::Network {
            message: format!("{label} failed: {err}"),
            status: err.status().map(|status| status.as_u16()),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            Self::Decode(_) => None,
        }
    }
}
