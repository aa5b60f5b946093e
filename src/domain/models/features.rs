use serde::Serialize;

/// Image transformation capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationFeatures {
    pub resize: bool,
    pub crop: bool,
    pub format: bool,
    pub quality: bool,
    pub blur: bool,
    pub rotate: bool,
    pub effects: bool,
}

/// Optional provider capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityFeatures {
    pub signed_uploads: bool,
    pub direct_upload: bool,
    pub multipart_upload: bool,
    pub video_processing: bool,
    pub ai_tagging: bool,
    pub facial_detection: bool,
}

/// Storage limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLimits {
    /// Largest accepted file in bytes
    pub max_file_size: u64,
    /// Accepted formats; `"*"` accepts everything
    pub supported_formats: &'static [&'static str],
}

/// Static capability matrix, one instance per provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFeatures {
    pub transformations: TransformationFeatures,
    pub capabilities: CapabilityFeatures,
    pub storage: StorageLimits,
}

/// A resolved leaf of the feature matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureValue {
    Flag(bool),
    Size(u64),
    Formats(&'static [&'static str]),
}

impl ProviderFeatures {
    /// Resolve a dotted path such as `transformations.resize` or
    /// `capabilities.multipartUpload`. Segments may be camelCase or
    /// snake_case. Unknown paths resolve to `None`.
    pub fn lookup(&self, path: &str) -> Option<FeatureValue> {
        let mut segments = path.split('.').map(normalize);
        let section = segments.next()?;
        let field = segments.next()?;

        let value = match section.as_str() {
            "transformations" => self.transformations.flag(&field).map(FeatureValue::Flag)?,
            "capabilities" => self.capabilities.flag(&field).map(FeatureValue::Flag)?,
            "storage" => match field.as_str() {
                "maxfilesize" => FeatureValue::Size(self.storage.max_file_size),
                "supportedformats" => match segments.next() {
                    Some(format) => {
                        return match segments.next() {
                            None => Some(FeatureValue::Flag(self.storage.accepts(&format))),
                            Some(_) => None,
                        };
                    }
                    None => FeatureValue::Formats(self.storage.supported_formats),
                },
                _ => return None,
            },
            _ => return None,
        };

        match segments.next() {
            None => Some(value),
            Some(_) => None,
        }
    }

    /// `true` only when `path` resolves to an enabled flag. Never panics.
    pub fn supports(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(FeatureValue::Flag(true)))
    }
}

impl TransformationFeatures {
    fn flag(&self, name: &str) -> Option<bool> {
        match name {
            "resize" => Some(self.resize),
            "crop" => Some(self.crop),
            "format" => Some(self.format),
            "quality" => Some(self.quality),
            "blur" => Some(self.blur),
            "rotate" => Some(self.rotate),
            "effects" => Some(self.effects),
            _ => None,
        }
    }

    pub fn any(&self) -> bool {
        self.resize || self.crop || self.format || self.quality || self.blur || self.rotate || self.effects
    }
}

impl CapabilityFeatures {
    fn flag(&self, name: &str) -> Option<bool> {
        match name {
            "signeduploads" => Some(self.signed_uploads),
            "directupload" => Some(self.direct_upload),
            "multipartupload" => Some(self.multipart_upload),
            "videoprocessing" => Some(self.video_processing),
            "aitagging" => Some(self.ai_tagging),
            "facialdetection" => Some(self.facial_detection),
            _ => None,
        }
    }
}

impl StorageLimits {
    pub fn accepts(&self, format: &str) -> bool {
        let format = format.trim_start_matches('.');
        self.supported_formats
            .iter()
            .any(|f| *f == "*" || f.eq_ignore_ascii_case(format))
    }
}

/// `multipartUpload` and `multipart_upload` both become `multipartupload`
fn normalize(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURES: ProviderFeatures = ProviderFeatures {
        transformations: TransformationFeatures {
            resize: true,
            crop: true,
            format: false,
            quality: false,
            blur: false,
            rotate: true,
            effects: false,
        },
        capabilities: CapabilityFeatures {
            signed_uploads: true,
            direct_upload: false,
            multipart_upload: true,
            video_processing: false,
            ai_tagging: false,
            facial_detection: false,
        },
        storage: StorageLimits {
            max_file_size: 1024,
            supported_formats: &["jpg", "png"],
        },
    };

    #[test]
    fn test_flags() {
        assert!(FEATURES.supports("transformations.resize"));
        assert!(!FEATURES.supports("transformations.blur"));
        assert!(FEATURES.supports("capabilities.multipartUpload"));
        assert!(FEATURES.supports("capabilities.multipart_upload"));
        assert!(!FEATURES.supports("capabilities.directUpload"));
    }

    #[test]
    fn test_unknown_paths_are_false() {
        for path in [
            "",
            ".",
            "nonexistent.path",
            "transformations",
            "transformations.resize.extra",
            "transformations.teleport",
            "storage.maxFileSize",
            "storage.supportedFormats",
            "storage.unknown",
            "storage.supportedFormats.png.extra",
        ] {
            assert!(!FEATURES.supports(path), "{}", path);
        }
    }

    #[test]
    fn test_storage_lookup() {
        assert_eq!(
            FEATURES.lookup("storage.maxFileSize"),
            Some(FeatureValue::Size(1024))
        );
        assert!(FEATURES.supports("storage.supportedFormats.png"));
        assert!(!FEATURES.supports("storage.supportedFormats.gif"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(FEATURES).unwrap();
        assert_eq!(json["capabilities"]["multipartUpload"], true);
        assert_eq!(json["storage"]["maxFileSize"], 1024);
    }
}
