//! Retry classification.
//!
//! An exchange on a pooled connection can fail simply because the peer closed
//! the connection while it sat idle. Such failures are worth one more attempt on
//! a fresh connection. Everything else (bad framing, undecodable bodies, bad
//! identifiers) would fail the same way again.

use crate::errors::FetchError;

/// Returns `true` when `err` is a connection-level failure that a retry on a new
/// connection may fix.
pub fn is_transient(err: &FetchError) -> bool {
    matches!(err, FetchError::ConnectionClosed | FetchError::Io(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn connection_failures_are_transient() {
        assert!(is_transient(&FetchError::ConnectionClosed));
        for kind in [io::ErrorKind::BrokenPipe, io::ErrorKind::ConnectionReset, io::ErrorKind::Other] {
            assert!(is_transient(&FetchError::Io(io::Error::from(kind))));
        }
    }

    #[test]
    fn everything_else_is_fatal() {
        let fatal = [
            FetchError::MalformedIdentifier("x".into()),
            FetchError::ProtocolViolation("x".into()),
            FetchError::DecodeError("x".into()),
            FetchError::TooManyRedirects(10),
            FetchError::MissingRedirectTarget { status: 302 },
            FetchError::Connect {
                origin: "http://h:80".into(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            },
            FetchError::RequestFailed {
                attempts: 2,
                source: Box::new(FetchError::ConnectionClosed),
            },
        ];
        for err in &fatal {
            assert!(!is_transient(err), "{err}");
        }
    }
}
