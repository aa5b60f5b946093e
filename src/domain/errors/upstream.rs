use http::StatusCode;
use thiserror::Error as ThisError;

use super::media_error::{ErrorKind, MediaError};

/// A backend failure reduced to the facts the classification rules look at
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamFailure {
    pub status: Option<StatusCode>,
    /// Backend-specific error code, e.g. `NoSuchKey`
    pub code: Option<String>,
    pub message: String,
    /// The request never got a response (timeout, refused connection)
    pub network: bool,
}

impl UpstreamFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
            network: false,
        }
    }

    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(message).with_status(status)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            network: true,
            ..Self::new(message)
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn status_is(&self, status: u16) -> bool {
        self.status.is_some_and(|s| s.as_u16() == status)
    }

    pub fn code_is(&self, code: &str) -> bool {
        self.code.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(code))
    }

    /// Case-insensitive substring match on the message
    pub fn mentions(&self, needle: &str) -> bool {
        self.message.to_ascii_lowercase().contains(needle)
    }

    /// Classify with `rules` and wrap into the taxonomy error
    pub fn into_media_error(
        self,
        rules: &[ErrorRule],
        fallback: ErrorKind,
        provider: &str,
    ) -> MediaError {
        let kind = classify(rules, &self, fallback);
        let mut error = MediaError::new(kind, provider, self.message.clone());
        if let Some(status) = self.status {
            error = error.with_detail("status", status.as_u16());
        }
        if let Some(code) = &self.code {
            error = error.with_detail("code", code.clone());
        }
        error.with_cause(self)
    }
}

/// One entry of an ordered classification table
#[derive(Clone, Copy)]
pub struct ErrorRule {
    pub kind: ErrorKind,
    pub matches: fn(&UpstreamFailure) -> bool,
}

impl std::fmt::Debug for ErrorRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRule").field("kind", &self.kind).finish()
    }
}

/// First matching rule wins; `fallback` when nothing matches
pub fn classify(rules: &[ErrorRule], failure: &UpstreamFailure, fallback: ErrorKind) -> ErrorKind {
    rules
        .iter()
        .find(|rule| (rule.matches)(failure))
        .map(|rule| rule.kind)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_forbidden(failure: &UpstreamFailure) -> bool {
        failure.status_is(403)
    }

    fn is_missing(failure: &UpstreamFailure) -> bool {
        failure.status_is(404) || failure.code_is("NoSuchKey")
    }

    const RULES: &[ErrorRule] = &[
        ErrorRule {
            kind: ErrorKind::Unauthorized,
            matches: is_forbidden,
        },
        ErrorRule {
            kind: ErrorKind::FileNotFound,
            matches: is_missing,
        },
    ];

    #[test]
    fn test_first_match_wins() {
        let failure = UpstreamFailure::http(StatusCode::FORBIDDEN, "denied").with_code("NoSuchKey");
        assert_eq!(classify(RULES, &failure, ErrorKind::UploadFailed), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_fallback() {
        let failure = UpstreamFailure::new("boom");
        assert_eq!(classify(RULES, &failure, ErrorKind::DeleteFailed), ErrorKind::DeleteFailed);
    }

    #[test]
    fn test_into_media_error_keeps_status() {
        let failure = UpstreamFailure::http(StatusCode::NOT_FOUND, "gone");
        let err = failure.into_media_error(RULES, ErrorKind::ProviderError, "s3");
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.detail("status"), Some(&serde_json::Value::from(404)));
        assert_eq!(err.message(), "gone");
    }

    #[test]
    fn test_mentions_is_case_insensitive() {
        assert!(UpstreamFailure::new("Request Timed Out").mentions("timed out"));
    }
}
