//! Error types for the Deploy provider.

use thiserror::Error;

/// Errors that can occur while talking to the Deploy API or reconciling resources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found (HTTP 404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The API answered with a failure status. The body is kept verbatim.
    #[error("API error: status: {status}, body: {body}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A request payload could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// A response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Operation failed due to current state (precondition not met).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Operation not supported by the API client.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Invalid request from the host.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// For API failures this is the raw response body.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Api { body, .. } => body,
            Self::Transport(_err) => "transport error (see Debug output)",
            Self::Encode(_err) => "encode error (see Debug output)",
            Self::Decode(_err) => "decode error (see Debug output)",
            Self::Url(_err) => "url error (see Debug output)",
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::FailedPrecondition(msg) => msg,
            Self::Unimplemented(msg) => msg,
            Self::InvalidRequest(msg) => msg,
        }
    }

    /// Whether this error means the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The HTTP status carried by this error, if it came from the API.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classify a failed HTTP response.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        if status == 404 {
            Self::NotFound(body)
        } else {
            Self::Api { status, body }
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("project-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: project-123");

        let err = ProviderError::Api {
            status: 500,
            body: "{\"code\":\"internalServerError\"}".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "API error: status: 500, body: {\"code\":\"internalServerError\"}"
        );

        let err = ProviderError::Unimplemented("deployment logs".to_string());
        assert_eq!(format!("{}", err), "Unimplemented: deployment logs");
    }

    #[test]
    fn test_from_status_classifies_not_found() {
        let err = ProviderError::from_status(404, "gone".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "gone");

        let err = ProviderError::from_status(401, "unauthorized".to_string());
        assert!(!err.is_not_found());
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.message(), "unauthorized");
    }

    #[test]
    fn test_decode_is_distinct_from_api_failure() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = ProviderError::Decode(json_err);
        assert!(err.status().is_none());
        assert!(!err.is_not_found());
        assert!(format!("{}", err).starts_with("Failed to decode response"));
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::Configuration("missing api_token".to_string());
        assert_eq!(err.message(), "missing api_token");

        let err = ProviderError::FailedPrecondition("not validated".to_string());
        assert_eq!(err.message(), "not validated");
    }
}
