use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error as ThisError;

/// Message used whenever an upstream failure carries nothing readable
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Closed set of failure kinds shared by every provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    UploadFailed,
    FileTooLarge,
    InvalidFileType,
    NetworkError,
    InvalidCredentials,
    Unauthorized,
    ProviderError,
    RateLimited,
    QuotaExceeded,
    InvalidConfig,
    MissingCredentials,
    FileNotFound,
    DeleteFailed,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 13] = [
        ErrorKind::UploadFailed,
        ErrorKind::FileTooLarge,
        ErrorKind::InvalidFileType,
        ErrorKind::NetworkError,
        ErrorKind::InvalidCredentials,
        ErrorKind::Unauthorized,
        ErrorKind::ProviderError,
        ErrorKind::RateLimited,
        ErrorKind::QuotaExceeded,
        ErrorKind::InvalidConfig,
        ErrorKind::MissingCredentials,
        ErrorKind::FileNotFound,
        ErrorKind::DeleteFailed,
    ];

    /// Stable wire code, e.g. `FILE_NOT_FOUND`
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UploadFailed => "UPLOAD_FAILED",
            ErrorKind::FileTooLarge => "FILE_TOO_LARGE",
            ErrorKind::InvalidFileType => "INVALID_FILE_TYPE",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::ProviderError => "PROVIDER_ERROR",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorKind::InvalidConfig => "INVALID_CONFIG",
            ErrorKind::MissingCredentials => "MISSING_CREDENTIALS",
            ErrorKind::FileNotFound => "FILE_NOT_FOUND",
            ErrorKind::DeleteFailed => "DELETE_FAILED",
        }
    }

    /// Whether repeating the same request may plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkError | ErrorKind::RateLimited | ErrorKind::ProviderError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// The only error type that leaves a provider or the uploader.
///
/// Carries the taxonomy kind, the provider that raised it, a readable
/// message, the upstream cause when there was one and optional structured
/// details (e.g. the failed ids of a batch delete).
#[derive(ThisError, Debug, Clone)]
#[error("{message}")]
pub struct MediaError {
    kind: ErrorKind,
    provider: String,
    message: String,
    #[source]
    cause: Option<Cause>,
    details: Option<Map<String, Value>>,
}

impl MediaError {
    pub fn new(kind: ErrorKind, provider: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        };

        Self {
            kind,
            provider: provider.into(),
            message,
            cause: None,
            details: None,
        }
    }

    /// Wrap an upstream error. The message is taken from the upstream value
    /// and falls back to [`UNKNOWN_ERROR_MESSAGE`] when there is none.
    pub fn from_upstream<E>(kind: ErrorKind, provider: impl Into<String>, upstream: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match upstream {
            Some(err) => {
                let message = err.to_string();
                let mut error = Self::new(kind, provider, message);
                error.cause = Some(Arc::new(err));
                error
            }
            None => Self::new(kind, provider, UNKNOWN_ERROR_MESSAGE),
        }
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn invalid_config(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, provider, message)
    }

    pub fn missing_credentials(provider: impl Into<String>, field: &str) -> Self {
        Self::new(
            ErrorKind::MissingCredentials,
            provider,
            format!("Missing required credential: {}", field),
        )
        .with_detail("field", field)
    }

    /// Raised when an optional provider capability is invoked on a provider
    /// that does not implement it
    pub fn unsupported(provider: impl Into<String>, operation: &str) -> Self {
        let provider = provider.into();
        let message = format!(
            "Operation '{}' is not supported by provider '{}'",
            operation, provider
        );
        Self::new(ErrorKind::ProviderError, provider, message).with_detail("operation", operation)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Result type for every provider and uploader operation
pub type MediaResult<T> = Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, ThisError)]
    #[error("{0}")]
    struct Upstream(String);

    #[test]
    fn test_kind_codes() {
        assert_eq!(ErrorKind::FileNotFound.as_str(), "FILE_NOT_FOUND");
        assert_eq!(ErrorKind::DeleteFailed.to_string(), "DELETE_FAILED");
        assert_eq!(
            serde_json::to_string(&ErrorKind::RateLimited).unwrap(),
            "\"RATE_LIMITED\""
        );
        assert_eq!(ErrorKind::ALL.len(), 13);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::NetworkError.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::InvalidCredentials.is_retryable());
        assert!(!ErrorKind::InvalidConfig.is_retryable());
    }

    #[test]
    fn test_empty_upstream_message_uses_placeholder() {
        let err = MediaError::from_upstream(ErrorKind::UploadFailed, "s3", Some(Upstream(String::new())));
        assert_eq!(err.message(), UNKNOWN_ERROR_MESSAGE);
        assert!(err.source().is_some());

        let err = MediaError::from_upstream::<Upstream>(ErrorKind::UploadFailed, "s3", None);
        assert_eq!(err.to_string(), UNKNOWN_ERROR_MESSAGE);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_unsupported_names_provider_and_operation() {
        let err = MediaError::unsupported("r2", "search");
        assert_eq!(err.kind(), ErrorKind::ProviderError);
        assert_eq!(err.provider(), "r2");
        assert!(err.message().contains("search"));
        assert!(err.message().contains("r2"));
        assert_eq!(err.detail("operation"), Some(&Value::from("search")));
    }
}
