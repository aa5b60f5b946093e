use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::progress::ProgressCallback;
use super::transformation::TransformationOptions;

/// Open key-value map carried on options and results
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Default number of concurrent operations inside one batch window
pub const DEFAULT_BATCH_CONCURRENCY: usize = 5;

/// Caller-supplied upload directives
#[derive(Clone, Builder)]
pub struct UploadOptions {
    /// Base name of the stored file
    #[builder(into)]
    pub filename: Option<String>,
    /// Path prefix
    #[builder(into)]
    pub folder: Option<String>,
    #[builder(default)]
    pub tags: BTreeSet<String>,
    /// Merged into the result metadata
    #[builder(default)]
    pub metadata: Metadata,
    pub on_progress: Option<ProgressCallback>,
    /// Only honoured by providers that support transformations
    pub transformation: Option<TransformationOptions>,
    /// Append a random suffix to `filename`
    #[builder(default = true)]
    pub unique_filename: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            filename: None,
            folder: None,
            tags: BTreeSet::new(),
            metadata: Metadata::new(),
            on_progress: None,
            transformation: None,
            unique_filename: true,
        }
    }
}

impl UploadOptions {
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("filename", &self.filename)
            .field("folder", &self.folder)
            .field("tags", &self.tags)
            .field("metadata", &self.metadata)
            .field("on_progress", &self.on_progress.is_some())
            .field("transformation", &self.transformation)
            .field("unique_filename", &self.unique_filename)
            .finish()
    }
}

/// Normalized outcome of an upload or a metadata read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Provider-assigned identifier, used for delete/get/get_url
    pub id: String,
    pub url: String,
    pub public_url: String,
    pub size: u64,
    /// Lowercase extension or format tag, empty when unknown
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub provider: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// Per-file progress callback: `(file index, percent)`
pub type FileProgressCallback = Arc<dyn Fn(usize, f64) + Send + Sync>;

/// How progress is reported for a batch upload
#[derive(Clone, Default)]
pub enum BatchProgress {
    #[default]
    None,
    /// One callback invocation per file update, tagged with the file index
    PerFile(FileProgressCallback),
    /// Mean percentage across every file in the batch
    Overall(ProgressCallback),
}

impl std::fmt::Debug for BatchProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchProgress::None => f.write_str("None"),
            BatchProgress::PerFile(_) => f.write_str("PerFile"),
            BatchProgress::Overall(_) => f.write_str("Overall"),
        }
    }
}

/// Options for `upload_multiple`
#[derive(Debug, Clone)]
pub struct BatchUploadOptions {
    /// Template for every file; its `on_progress` is replaced per file
    pub base: UploadOptions,
    /// Size of each concurrently executed window
    pub concurrency: usize,
    pub progress: BatchProgress,
}

impl Default for BatchUploadOptions {
    fn default() -> Self {
        Self {
            base: UploadOptions::default(),
            concurrency: DEFAULT_BATCH_CONCURRENCY,
            progress: BatchProgress::None,
        }
    }
}

impl BatchUploadOptions {
    pub fn new(base: UploadOptions) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_progress(mut self, progress: BatchProgress) -> Self {
        self.progress = progress;
        self
    }
}

impl From<UploadOptions> for BatchUploadOptions {
    fn from(base: UploadOptions) -> Self {
        Self::new(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_filename_defaults_to_true() {
        assert!(UploadOptions::default().unique_filename);
        assert!(UploadOptions::builder().filename("a").build().unique_filename);
        assert!(!UploadOptions::builder().unique_filename(false).build().unique_filename);
    }

    #[test]
    fn test_builder_fields() {
        let options = UploadOptions::builder()
            .filename("avatar")
            .folder("users")
            .build()
            .with_tag("profile")
            .with_metadata("owner", 42);
        assert_eq!(options.filename.as_deref(), Some("avatar"));
        assert_eq!(options.folder.as_deref(), Some("users"));
        assert!(options.tags.contains("profile"));
        assert_eq!(options.metadata["owner"], 42);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = UploadResult {
            id: "t/x".into(),
            url: "u".into(),
            public_url: "u".into(),
            size: 10,
            format: String::new(),
            width: None,
            height: None,
            provider: "s3".into(),
            metadata: Metadata::new(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["publicUrl"], "u");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("width").is_none());
    }

    #[test]
    fn test_batch_defaults() {
        let batch = BatchUploadOptions::default();
        assert_eq!(batch.concurrency, DEFAULT_BATCH_CONCURRENCY);
        assert!(matches!(batch.progress, BatchProgress::None));
    }
}
