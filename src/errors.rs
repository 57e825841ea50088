use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot connect to {origin}: {source}")]
    Connect {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request failed after {attempts} attempt(s)")]
    RequestFailed {
        attempts: usize,
        #[source]
        source: Box<FetchError>,
    },

    #[error("Too many redirects (limit is {0})")]
    TooManyRedirects(usize),

    #[error("Redirect status {status} without a location header")]
    MissingRedirectTarget { status: u16 },

    #[error("Cannot decode body: {0}")]
    DecodeError(String),

    #[error("Resource unavailable: {}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Local file access is disabled: {0}")]
    FileAccessDisabled(String),
}

impl FetchError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        FetchError::MalformedIdentifier(msg.into())
    }

    pub(crate) fn violation(msg: impl Into<String>) -> Self {
        FetchError::ProtocolViolation(msg.into())
    }
}
