//! Error types for outfit generation and background editing operations

use thiserror::Error;

/// Result type alias for outfit generation operations
pub type Result<T> = std::result::Result<T, OutfitError>;

/// Comprehensive error types for the outfit generation service
#[derive(Error, Debug)]
pub enum OutfitError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format or processing errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed or incomplete client request (missing fields, bad base64,
    /// undecodable image payloads, unsupported MIME types)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration or missing external-service credentials
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generative-image provider request failures, sub-classified by the
    /// provider's error message
    #[error("Image model error: {0}")]
    Provider(#[from] ProviderError),

    /// Hosted store failures (object upload, row insert/select/delete)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Pixel pipeline errors (mask/bitmap mismatch, encode failures)
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OutfitError {
    /// Create a new invalid request error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a request error for a field that failed validation
    pub fn invalid_field(field: &str, reason: &str) -> Self {
        Self::InvalidRequest(format!("field '{field}': {reason}"))
    }

    /// Create a storage error with operation context
    pub fn storage_op(operation: &str, details: &str) -> Self {
        Self::Storage(format!("failed to {operation}: {details}"))
    }

    /// HTTP status code this error maps to.
    ///
    /// Client input errors map to 400, missing credentials to 500, and
    /// provider failures to the per-category codes in
    /// [`ProviderErrorKind::http_status`]. Everything else is a 500 with the
    /// underlying message passed through.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Provider(provider) => provider.kind.http_status(),
            Self::Io(_)
            | Self::Image(_)
            | Self::InvalidConfig(_)
            | Self::Storage(_)
            | Self::Processing(_)
            | Self::Internal(_) => 500,
        }
    }
}

/// Failure categories for the hosted generative-image API.
///
/// The provider reports failures as free-form messages; categories are
/// recovered by substring matching, which is the contract the HTTP layer
/// relies on for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Quota or rate limit exhausted
    QuotaExceeded,
    /// Request or response blocked by the provider's safety system
    SafetyBlocked,
    /// Provider rejected the request arguments
    InvalidArgument,
    /// Missing or insufficient permission (bad API key, disabled API)
    PermissionDenied,
    /// Provider-side or transport deadline exceeded
    Timeout,
    /// Provider returned a well-formed response with no usable image
    EmptyResponse,
    /// Anything that does not match a known category
    Unknown,
}

impl ProviderErrorKind {
    /// HTTP status code for this provider failure category
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::QuotaExceeded => 429,
            Self::SafetyBlocked | Self::InvalidArgument => 400,
            Self::PermissionDenied => 403,
            Self::Timeout => 504,
            Self::EmptyResponse | Self::Unknown => 500,
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded => write!(f, "quota exceeded"),
            Self::SafetyBlocked => write!(f, "safety blocked"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Timeout => write!(f, "timeout"),
            Self::EmptyResponse => write!(f, "empty response"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// An error reported by the generative-image provider
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ProviderError {
    /// Recovered failure category
    pub kind: ProviderErrorKind,
    /// Original provider message, passed through verbatim
    pub message: String,
}

impl ProviderError {
    /// Create a provider error with an explicit category
    pub fn new<S: Into<String>>(kind: ProviderErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a provider error message by substring matching.
    ///
    /// Categories are checked in the order the provider documents them:
    /// quota, safety, invalid argument, permission, timeout. Unmatched
    /// messages are `Unknown` and keep the original text.
    pub fn classify<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        let kind = if lowered.contains("quota")
            || lowered.contains("resource_exhausted")
            || lowered.contains("rate limit")
        {
            ProviderErrorKind::QuotaExceeded
        } else if lowered.contains("safety") || lowered.contains("blocked") {
            ProviderErrorKind::SafetyBlocked
        } else if lowered.contains("invalid_argument") || lowered.contains("invalid argument") {
            ProviderErrorKind::InvalidArgument
        } else if lowered.contains("permission") || lowered.contains("unauthorized") {
            ProviderErrorKind::PermissionDenied
        } else if lowered.contains("deadline")
            || lowered.contains("timeout")
            || lowered.contains("timed out")
        {
            ProviderErrorKind::Timeout
        } else {
            ProviderErrorKind::Unknown
        };

        Self { kind, message }
    }

    /// Provider answered successfully but produced no image candidate
    #[must_use]
    pub fn empty_response() -> Self {
        Self {
            kind: ProviderErrorKind::EmptyResponse,
            message: "no response from the AI model".to_string(),
        }
    }

    /// Map a transport-level failure onto a provider category.
    ///
    /// Request timeouts keep their 504 mapping; every other transport
    /// failure is passed through as unknown.
    #[must_use]
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::new(
                ProviderErrorKind::Timeout,
                format!("image model request timed out: {error}"),
            )
        } else {
            Self::new(
                ProviderErrorKind::Unknown,
                format!("image model request failed: {error}"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = OutfitError::invalid_request("missing image payload");
        assert!(matches!(err, OutfitError::InvalidRequest(_)));

        let err = OutfitError::invalid_config("GEMINI_API_KEY is not set");
        assert!(matches!(err, OutfitError::InvalidConfig(_)));
    }

    #[test]
    fn test_error_display() {
        let err = OutfitError::invalid_request("garments must not be empty");
        assert_eq!(err.to_string(), "Invalid request: garments must not be empty");

        let err = OutfitError::invalid_field("kind", "expected 'top' or 'bottom'");
        assert_eq!(
            err.to_string(),
            "Invalid request: field 'kind': expected 'top' or 'bottom'"
        );
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(OutfitError::invalid_request("bad base64").http_status(), 400);
        assert_eq!(OutfitError::invalid_config("no key").http_status(), 500);
        assert_eq!(OutfitError::storage("insert failed").http_status(), 500);
        assert_eq!(OutfitError::processing("mask mismatch").http_status(), 500);
    }

    #[test]
    fn test_provider_classification() {
        let cases = [
            ("Quota exceeded for quota metric", ProviderErrorKind::QuotaExceeded, 429),
            ("RESOURCE_EXHAUSTED: too many requests", ProviderErrorKind::QuotaExceeded, 429),
            ("Response blocked by SAFETY settings", ProviderErrorKind::SafetyBlocked, 400),
            ("INVALID_ARGUMENT: bad image data", ProviderErrorKind::InvalidArgument, 400),
            ("PERMISSION_DENIED: API key invalid", ProviderErrorKind::PermissionDenied, 403),
            ("DEADLINE_EXCEEDED while generating", ProviderErrorKind::Timeout, 504),
            ("request timed out", ProviderErrorKind::Timeout, 504),
            ("something novel happened", ProviderErrorKind::Unknown, 500),
        ];

        for (message, expected_kind, expected_status) in cases {
            let err = ProviderError::classify(message);
            assert_eq!(err.kind, expected_kind, "message: {message}");
            assert_eq!(err.kind.http_status(), expected_status, "message: {message}");
            // Original message always passes through verbatim
            assert_eq!(err.message, message);
        }
    }

    #[test]
    fn test_empty_response_is_internal() {
        let err = ProviderError::empty_response();
        assert_eq!(err.kind, ProviderErrorKind::EmptyResponse);
        assert_eq!(err.kind.http_status(), 500);
        assert!(err.message.contains("no response"));

        let wrapped: OutfitError = err.into();
        assert_eq!(wrapped.http_status(), 500);
    }
}
