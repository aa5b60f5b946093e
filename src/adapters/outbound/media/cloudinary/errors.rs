use crate::adapters::outbound::storage::error::{is_network, is_too_large};
use crate::domain::errors::{ErrorKind, ErrorRule, UpstreamFailure};

fn is_invalid_credentials(f: &UpstreamFailure) -> bool {
    f.status_is(401)
        || f.mentions("invalid api_key")
        || f.mentions("unknown api_key")
        || f.mentions("invalid signature")
}

fn is_unauthorized(f: &UpstreamFailure) -> bool {
    f.status_is(403)
}

fn is_rate_limited(f: &UpstreamFailure) -> bool {
    f.status_is(420) || f.status_is(429) || f.mentions("rate limit")
}

fn is_quota_exceeded(f: &UpstreamFailure) -> bool {
    f.mentions("quota") || f.mentions("usage limit")
}

fn is_not_found(f: &UpstreamFailure) -> bool {
    f.status_is(404) || f.mentions("resource not found")
}

fn is_file_too_large(f: &UpstreamFailure) -> bool {
    is_too_large(f) || f.mentions("file size too large")
}

fn is_invalid_file(f: &UpstreamFailure) -> bool {
    f.status_is(415)
        || f.mentions("invalid image file")
        || f.mentions("invalid file")
        || f.mentions("unsupported file")
}

/// Classification for the media API, highest priority first
pub const CLOUDINARY_RULES: &[ErrorRule] = &[
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
        matches: is_file_too_large,
    },
    ErrorRule {
        kind: ErrorKind::InvalidFileType,
        matches: is_invalid_file,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::classify;
    use http::StatusCode;

    fn kind(failure: UpstreamFailure) -> ErrorKind {
        classify(CLOUDINARY_RULES, &failure, ErrorKind::UploadFailed)
    }

    #[test]
    fn test_cloudinary_statuses() {
        assert_eq!(
            kind(UpstreamFailure::http(StatusCode::UNAUTHORIZED, "Invalid Signature")),
            ErrorKind::InvalidCredentials
        );
        assert_eq!(
            kind(UpstreamFailure::http(StatusCode::from_u16(420).unwrap(), "Rate Limit Exceeded")),
            ErrorKind::RateLimited
        );
        assert_eq!(
            kind(UpstreamFailure::http(StatusCode::NOT_FOUND, "Resource not found - x")),
            ErrorKind::FileNotFound
        );
    }

    #[test]
    fn test_cloudinary_messages() {
        assert_eq!(
            kind(UpstreamFailure::http(StatusCode::BAD_REQUEST, "File size too large. Got 20000000.")),
            ErrorKind::FileTooLarge
        );
        assert_eq!(
            kind(UpstreamFailure::http(StatusCode::BAD_REQUEST, "Invalid image file")),
            ErrorKind::InvalidFileType
        );
        assert_eq!(
            kind(UpstreamFailure::http(StatusCode::BAD_REQUEST, "Monthly quota reached")),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(kind(UpstreamFailure::network("connection reset")), ErrorKind::NetworkError);
        assert_eq!(
            kind(UpstreamFailure::http(StatusCode::BAD_REQUEST, "Missing required parameter")),
            ErrorKind::UploadFailed
        );
    }
}
