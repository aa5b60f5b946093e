mod magic;

pub use magic::MagicByteDetector;

use crate::domain::FileInput;
use crate::ports::detection::FileTypeDetector;

/// Content type used when nothing better is known
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The content type an adapter stores a file with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub mime: String,
    /// Extension reported by the detector, when it ran and matched
    pub detected_ext: Option<String>,
}

/// Raw bytes are always sniffed. A file handle's declared type wins unless it
/// is blank or `force_detect` is set. Falls back to
/// [`DEFAULT_CONTENT_TYPE`].
pub fn resolve_content_type(
    file: &FileInput,
    detector: &dyn FileTypeDetector,
    force_detect: bool,
) -> ResolvedType {
    if !force_detect {
        if let Some(declared) = file.declared_type() {
            return ResolvedType {
                mime: declared.to_string(),
                detected_ext: None,
            };
        }
    }

    match detector.detect(file.bytes()) {
        Some(detected) => ResolvedType {
            mime: detected.mime,
            detected_ext: Some(detected.ext),
        },
        None => ResolvedType {
            mime: file
                .declared_type()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            detected_ext: None,
        },
    }
}
