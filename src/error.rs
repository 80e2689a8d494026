//! Error types for the control-plane provider.

use thiserror::Error;

use crate::operation::HttpMethod;

/// Errors that can occur while executing provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never produced an HTTP response (connection, TLS, DNS).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The control plane answered with a non-2xx status.
    #[error("HTTP {status} from {method} {url}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The method of the failed request.
        method: HttpMethod,
        /// The requested URL.
        url: String,
        /// The (possibly truncated) response body.
        body: String,
    },

    /// A payload or identifier did not have the expected shape.
    #[error("Structural error: {0}")]
    Structural(String),

    /// A JSON serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested remote object was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The operation did not finish before its deadline.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// An error annotated with the operation and resource it occurred in.
    #[error("{operation} failed for {resource}: {source}")]
    Operation {
        /// The operation name, e.g. `SidecarCreate`.
        operation: String,
        /// The resource identifier, or `<new>` before one was assigned.
        resource: String,
        /// The underlying error.
        #[source]
        source: Box<ProviderError>,
    },
}

/// Coarse classification of a [`ProviderError`].
///
/// Wrapping an error with [`ProviderError::in_operation`] never changes its
/// kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network/connection failure.
    Transport,
    /// Non-2xx response.
    Http,
    /// Wire-format or identifier mismatch.
    Structural,
    /// Schema-level constraint violation.
    Validation,
    /// Provider configuration problem.
    Configuration,
    /// Missing remote object.
    NotFound,
    /// Unknown resource or data source type.
    UnknownResource,
    /// Deadline elapsed.
    DeadlineExceeded,
    /// Unsupported operation.
    Unimplemented,
}

impl ProviderError {
    /// Classify this error, looking through operation context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Http { .. } => ErrorKind::Http,
            Self::Structural(_) | Self::Serialization(_) => ErrorKind::Structural,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UnknownResource(_) => ErrorKind::UnknownResource,
            Self::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
            Self::Unimplemented(_) => ErrorKind::Unimplemented,
            Self::Operation { source, .. } => source.kind(),
        }
    }

    /// The HTTP status code, if this error came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Operation { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the remote signalled that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404) || self.kind() == ErrorKind::NotFound
    }

    /// Annotate the error with the operation name and resource identifier.
    pub fn in_operation(self, operation: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.into(),
            resource: resource.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, without operation context.
    pub fn root(&self) -> &ProviderError {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ProviderError {
        ProviderError::Http {
            status,
            method: HttpMethod::Get,
            url: "https://cp.example.com/v1/sidecars/abc".to_string(),
            body: "{}".to_string(),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Structural("expected 2 parts".to_string());
        assert_eq!(format!("{}", err), "Structural error: expected 2 parts");

        let err = ProviderError::UnknownResource("cp_widget".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: cp_widget");

        let err = http(500);
        assert_eq!(
            format!("{}", err),
            "HTTP 500 from GET https://cp.example.com/v1/sidecars/abc: {}"
        );
    }

    #[test]
    fn test_operation_context_keeps_kind() {
        let err = http(409).in_operation("SidecarCreate", "<new>");
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status(), Some(409));
        assert!(err.to_string().starts_with("SidecarCreate failed for <new>: HTTP 409"));

        let err = ProviderError::Structural("bad".to_string())
            .in_operation("ListenerRead", "s1/l1")
            .in_operation("ListenerCreate", "s1/l1");
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(matches!(err.root(), ProviderError::Structural(_)));
    }

    #[test]
    fn test_is_not_found() {
        assert!(http(404).is_not_found());
        assert!(http(404).in_operation("SidecarRead", "abc").is_not_found());
        assert!(ProviderError::NotFound("sidecar".to_string()).is_not_found());
        assert!(!http(500).is_not_found());
        assert!(!ProviderError::Validation("x".to_string()).is_not_found());
    }

    #[test]
    fn test_serialization_is_structural() {
        let err: ProviderError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }
}
