use http::StatusCode;

use crate::domain::errors::{ErrorKind, ErrorRule, UpstreamFailure};

/// Convert object_store errors into the facts the rule tables classify on
impl From<object_store::Error> for UpstreamFailure {
    fn from(err: object_store::Error) -> Self {
        let message = err.to_string();
        match err {
            object_store::Error::NotFound { .. } => {
                UpstreamFailure::http(StatusCode::NOT_FOUND, message).with_code("NoSuchKey")
            }
            object_store::Error::AlreadyExists { .. } => {
                UpstreamFailure::http(StatusCode::CONFLICT, message)
            }
            object_store::Error::Precondition { .. } => {
                UpstreamFailure::http(StatusCode::PRECONDITION_FAILED, message)
            }
            object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
                UpstreamFailure::new(message).with_code("NotImplemented")
            }
            _ => from_message(message),
        }
    }
}

/// Recover status and service code from a rendered client error, e.g.
/// `Client error with status 403 Forbidden: <Error><Code>AccessDenied</Code>…`
fn from_message(message: String) -> UpstreamFailure {
    let status = parse_status(&message);
    let code = parse_code(&message);
    let network = status.is_none() && looks_like_network(&message);

    let mut failure = UpstreamFailure::new(message);
    failure.status = status;
    failure.code = code;
    failure.network = network;
    failure
}

fn parse_status(message: &str) -> Option<StatusCode> {
    let lower = message.to_ascii_lowercase();
    lower.match_indices("status").find_map(|(idx, _)| {
        let rest = &message[idx + "status".len()..];
        let rest = rest.trim_start_matches(|c: char| c == ' ' || c == ':' || c == '=' || c.is_ascii_alphabetic());
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if digits.len() != 3 {
            return None;
        }
        digits.parse::<u16>().ok().and_then(|s| StatusCode::from_u16(s).ok())
    })
}

fn parse_code(message: &str) -> Option<String> {
    let start = message.find("<Code>")? + "<Code>".len();
    let end = message[start..].find("</Code>")? + start;
    let code = message[start..end].trim();
    (!code.is_empty()).then(|| code.to_string())
}

fn looks_like_network(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["timed out", "timeout", "connection", "error sending request", "dns error", "broken pipe"]
        .iter()
        .any(|needle| lower.contains(needle))
}

pub(crate) fn is_invalid_credentials(f: &UpstreamFailure) -> bool {
    f.status_is(401)
        || f.code_is("InvalidAccessKeyId")
        || f.code_is("SignatureDoesNotMatch")
        || f.code_is("InvalidToken")
        || f.code_is("ExpiredToken")
}

pub(crate) fn is_unauthorized(f: &UpstreamFailure) -> bool {
    f.status_is(403) || f.code_is("AccessDenied")
}

pub(crate) fn is_rate_limited(f: &UpstreamFailure) -> bool {
    f.status_is(429) || f.code_is("SlowDown") || f.code_is("TooManyRequests")
}

pub(crate) fn is_quota_exceeded(f: &UpstreamFailure) -> bool {
    f.code_is("QuotaExceeded") || f.mentions("quota")
}

pub(crate) fn is_not_found(f: &UpstreamFailure) -> bool {
    f.status_is(404) || f.code_is("NoSuchKey")
}

pub(crate) fn is_network(f: &UpstreamFailure) -> bool {
    f.network
        || f.status_is(408)
        || f.status_is(504)
        || f.code_is("RequestTimeout")
        || f.mentions("timed out")
}

pub(crate) fn is_too_large(f: &UpstreamFailure) -> bool {
    f.status_is(413) || f.code_is("EntityTooLarge")
}

pub(crate) fn is_unsupported_media(f: &UpstreamFailure) -> bool {
    f.status_is(415)
}

/// Classification for S3-compatible object stores, highest priority first
pub const OBJECT_STORE_RULES: &[ErrorRule] = &[
    ErrorRule {
        kind: ErrorKind::InvalidCredentials,
        matches: is_invalid_credentials,
    },
    ErrorRule {
        kind: ErrorKind::Unauthorized,
        matches: is_unauthorized,
    },
    ErrorRule {
        kind: ErrorKind::RateLimited,
        matches: is_rate_limited,
    },
    ErrorRule {
        kind: ErrorKind::QuotaExceeded,
        matches: is_quota_exceeded,
    },
    ErrorRule {
        kind: ErrorKind::FileNotFound,
        matches: is_not_found,
    },
    ErrorRule {
        kind: ErrorKind::NetworkError,
        matches: is_network,
    },
    ErrorRule {
        kind: ErrorKind::FileTooLarge,
        matches: is_too_large,
    },
    ErrorRule {
        kind: ErrorKind::InvalidFileType,
        matches: is_unsupported_media,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::classify;

    fn kind_of(message: &str) -> ErrorKind {
        let failure = from_message(message.to_string());
        classify(OBJECT_STORE_RULES, &failure, ErrorKind::UploadFailed)
    }

    #[test]
    fn test_parse_status_and_code() {
        let failure = from_message(
            "Client error with status 403 Forbidden: <Error><Code>AccessDenied</Code></Error>".into(),
        );
        assert_eq!(failure.status, Some(StatusCode::FORBIDDEN));
        assert_eq!(failure.code.as_deref(), Some("AccessDenied"));
        assert!(!failure.network);
    }

    #[test]
    fn test_rule_priority() {
        assert_eq!(
            kind_of("status 403: <Code>InvalidAccessKeyId</Code>"),
            ErrorKind::InvalidCredentials
        );
        assert_eq!(kind_of("status 403 Forbidden"), ErrorKind::Unauthorized);
        assert_eq!(kind_of("status 503: <Code>SlowDown</Code>"), ErrorKind::RateLimited);
        assert_eq!(kind_of("status 413 Payload Too Large"), ErrorKind::FileTooLarge);
        assert_eq!(kind_of("operation timed out"), ErrorKind::NetworkError);
        assert_eq!(kind_of("something odd"), ErrorKind::UploadFailed);
    }

    #[test]
    fn test_not_found_maps_to_file_not_found() {
        let err = object_store::Error::NotFound {
            path: "a/b".into(),
            source: "missing".into(),
        };
        let failure = UpstreamFailure::from(err);
        assert_eq!(
            classify(OBJECT_STORE_RULES, &failure, ErrorKind::ProviderError),
            ErrorKind::FileNotFound
        );
    }
}
