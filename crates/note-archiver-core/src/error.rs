use std::fmt;

use thiserror::Error;

/// Closed set of transport failures that are recovered per URL.
///
/// Anything the transport cannot place in one of these buckets is reported
/// as [`AppError::HttpError`] instead and is not contained by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkFailureKind {
    /// Open/connect or read timeout.
    Timeout,
    ConnectionRefused,
    /// Host name could not be resolved.
    DnsFailure,
    /// TLS handshake or certificate verification failed.
    TlsFailure,
    TooManyRedirects,
    /// Response could not be read or decoded.
    DecodeFailure,
    /// Any other socket-level failure (reset, unreachable, bad address).
    SocketFailure,
}

impl NetworkFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkFailureKind::Timeout => "timeout",
            NetworkFailureKind::ConnectionRefused => "connection_refused",
            NetworkFailureKind::DnsFailure => "dns_failure",
            NetworkFailureKind::TlsFailure => "tls_failure",
            NetworkFailureKind::TooManyRedirects => "too_many_redirects",
            NetworkFailureKind::DecodeFailure => "decode_failure",
            NetworkFailureKind::SocketFailure => "socket_failure",
        }
    }
}

impl fmt::Display for NetworkFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application-wide error types for the note archiver.
#[derive(Error, Debug)]
pub enum AppError {
    /// Classified transport failure. Contained per URL by the dispatcher.
    #[error("Network error ({kind}): {message}")]
    Network {
        kind: NetworkFailureKind,
        message: String,
    },

    /// HTTP failure the transport could not classify.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The source record could not be used.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn network(kind: NetworkFailureKind, message: impl Into<String>) -> Self {
        AppError::Network {
            kind,
            message: message.into(),
        }
    }

    /// Returns the failure kind if this error belongs to the closed network set.
    pub fn network_kind(&self) -> Option<NetworkFailureKind> {
        match self {
            AppError::Network { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns true if this error is a network-transient failure that should
    /// be logged and skipped rather than abort the batch.
    pub fn is_network_transient(&self) -> bool {
        self.network_kind().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_transient() {
        for kind in [
            NetworkFailureKind::Timeout,
            NetworkFailureKind::ConnectionRefused,
            NetworkFailureKind::DnsFailure,
            NetworkFailureKind::TlsFailure,
            NetworkFailureKind::TooManyRedirects,
            NetworkFailureKind::DecodeFailure,
            NetworkFailureKind::SocketFailure,
        ] {
            assert!(AppError::network(kind, "boom").is_network_transient());
        }
    }

    #[test]
    fn test_unclassified_errors_are_not_transient() {
        assert!(!AppError::HttpError("builder".into()).is_network_transient());
        assert!(!AppError::ConfigError("bad".into()).is_network_transient());
        assert!(!AppError::Generic("oops".into()).is_network_transient());
        assert!(!AppError::InvalidRecord("empty id".into()).is_network_transient());
    }

    #[test]
    fn test_network_error_display_includes_kind() {
        let err = AppError::network(NetworkFailureKind::DnsFailure, "no such host");
        assert_eq!(err.to_string(), "Network error (dns_failure): no such host");
        assert_eq!(err.network_kind(), Some(NetworkFailureKind::DnsFailure));
    }
}
