use super::media_error::{ErrorKind, MediaError};

/// Validation errors for value objects and provider configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // ObjectKey validation errors
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),
    ObjectKeyStartsWithSlash,
    ObjectKeyContainsDoubleSlash,
    ObjectKeyContainsRelativeSegment,

    // BucketName validation errors
    BucketNameTooShort {
        actual: usize,
        min: usize,
    },
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },
    BucketNameInvalidStart,
    BucketNameInvalidEnd,
    BucketNameInvalidCharacter(char),
    BucketNameContainsPathSeparator,
    BucketNameConsecutiveHyphens,
    BucketNameLooksLikeIpAddress,

    // Provider configuration errors
    MissingField(&'static str),
    InvalidField {
        field: String,
        value: String,
        expected: String,
    },
}

impl ValidationError {
    /// Convert into the shared taxonomy error for the given provider
    pub fn into_media_error(self, kind: ErrorKind, provider: &str) -> MediaError {
        let field = match &self {
            ValidationError::MissingField(field) => Some(field.to_string()),
            ValidationError::InvalidField { field, .. } => Some(field.clone()),
            _ => None,
        };

        let error = MediaError::new(kind, provider, self.to_string());
        match field {
            Some(field) => error.with_detail("field", field),
            None => error,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectKey errors
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: {:?}", c)
            }
            ValidationError::ObjectKeyStartsWithSlash => {
                write!(f, "Object key cannot start with '/'")
            }
            ValidationError::ObjectKeyContainsDoubleSlash => {
                write!(f, "Object key cannot contain '//'")
            }
            ValidationError::ObjectKeyContainsRelativeSegment => {
                write!(f, "Object key cannot contain '.' or '..' segments")
            }

            // BucketName errors
            ValidationError::BucketNameTooShort { actual, min } => {
                write!(
                    f,
                    "Bucket name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::BucketNameInvalidStart => {
                write!(f, "Bucket name must start with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidEnd => {
                write!(f, "Bucket name must end with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in bucket name: '{}'. Only lowercase letters, numbers, dots and hyphens allowed",
                    c
                )
            }
            ValidationError::BucketNameContainsPathSeparator => {
                write!(f, "Bucket name cannot contain a path separator")
            }
            ValidationError::BucketNameConsecutiveHyphens => {
                write!(f, "Bucket name cannot contain consecutive hyphens")
            }
            ValidationError::BucketNameLooksLikeIpAddress => {
                write!(f, "Bucket name cannot be formatted as an IP address")
            }

            // Configuration errors
            ValidationError::MissingField(field) => {
                write!(f, "Missing required configuration field: {}", field)
            }
            ValidationError::InvalidField {
                field,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Invalid value for field '{}': '{}' (expected: {})",
                    field, value, expected
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_becomes_invalid_config() {
        let err = ValidationError::MissingField("bucket").into_media_error(ErrorKind::InvalidConfig, "s3");
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert_eq!(err.provider(), "s3");
        assert!(err.message().contains("bucket"));
        assert_eq!(err.detail("field").and_then(|v| v.as_str()), Some("bucket"));
    }
}
