use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::{create_plugin, Plugin, PluginHooks, PluginOptions};
use crate::domain::{ErrorKind, FileInput, MediaError, MediaResult, Metadata, UploadOptions, UploadResult};

pub const PLUGIN_NAME: &str = "metadata";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Md5,
}

impl ChecksumAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Md5 => "md5",
        }
    }

    /// Lowercase hex digest of `data`
    pub fn digest(&self, data: &[u8]) -> String {
        match self {
            ChecksumAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            ChecksumAlgorithm::Md5 => format!("{:x}", md5::compute(data)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataOptions {
    pub checksum: Option<ChecksumAlgorithm>,
    /// Static entries added to every upload; caller metadata wins on conflict
    pub fields: Metadata,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            checksum: Some(ChecksumAlgorithm::Sha256),
            fields: Metadata::new(),
        }
    }
}

impl MetadataOptions {
    pub fn without_checksum(mut self) -> Self {
        self.checksum = None;
        self
    }

    pub fn with_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum = Some(algorithm);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

async fn enrich(options: &MetadataOptions, file: &FileInput, upload: &mut UploadOptions) -> MediaResult<()> {
    if let Some(algorithm) = options.checksum {
        let data = file.bytes().clone();
        let checksum = tokio::task::spawn_blocking(move || algorithm.digest(&data))
            .await
            .map_err(|e| {
                MediaError::new(ErrorKind::UploadFailed, PLUGIN_NAME, "Checksum computation failed")
                    .with_cause(e)
            })?;
        upload.metadata.insert("checksum".into(), checksum.into());
        upload
            .metadata
            .insert("checksumAlgorithm".into(), algorithm.as_str().into());
    }

    if let Some(name) = file.name().or(upload.filename.as_deref()) {
        let name = name.to_string();
        upload.metadata.entry("originalFilename").or_insert(name.into());
    }
    upload
        .metadata
        .entry("uploadedAt")
        .or_insert(Utc::now().to_rfc3339().into());

    for (key, value) in &options.fields {
        upload.metadata.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Ok(())
}

/// Make sure the static fields made it to the result, whatever the provider
/// echoes back
fn complete(options: &MetadataOptions, result: &mut UploadResult) {
    for (key, value) in &options.fields {
        result.metadata.entry(key.clone()).or_insert_with(|| value.clone());
    }
    if !result.metadata.contains_key("uploadedAt") {
        result
            .metadata
            .insert("uploadedAt".into(), result.created_at.to_rfc3339().into());
    }
}

/// Adds a checksum, the original filename, an upload timestamp and any static
/// fields to upload metadata
pub fn metadata_plugin(options: MetadataOptions) -> Plugin {
    let config = json!({
        "checksum": options.checksum.map(|a| a.as_str()),
        "fields": options.fields.keys().collect::<Vec<_>>(),
    });
    let options = Arc::new(options);
    let before = options.clone();
    let after = options;

    create_plugin(
        PLUGIN_NAME,
        PluginOptions::version(env!("CARGO_PKG_VERSION")).with_config(config),
        PluginHooks::new()
            .before_upload(move |file, mut upload| {
                let options = before.clone();
                async move {
                    enrich(&options, &file, &mut upload).await?;
                    Ok(Some((file, upload)))
                }
            })
            .after_upload(move |mut result| {
                let options = after.clone();
                async move {
                    complete(&options, &mut result);
                    Ok(Some(result))
                }
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileHandle;
    use bytes::Bytes;

    #[test]
    fn test_digests() {
        assert_eq!(
            ChecksumAlgorithm::Sha256.digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            ChecksumAlgorithm::Md5.digest(b"abc"),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[tokio::test]
    async fn test_enrich_adds_entries_without_overwriting() {
        let options = MetadataOptions::default()
            .with_field("team", "media")
            .with_field("owner", "static");
        let file = FileInput::File(FileHandle::new(Bytes::from_static(b"abc")).with_name("photo.jpg"));
        let mut upload = UploadOptions::default().with_metadata("owner", "caller");

        enrich(&options, &file, &mut upload).await.unwrap();

        let metadata = &upload.metadata;
        assert_eq!(metadata["checksumAlgorithm"], "sha256");
        assert_eq!(
            metadata["checksum"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(metadata["originalFilename"], "photo.jpg");
        assert_eq!(metadata["team"], "media");
        assert_eq!(metadata["owner"], "caller");
        assert!(metadata.contains_key("uploadedAt"));
    }

    #[tokio::test]
    async fn test_checksum_can_be_disabled() {
        let mut upload = UploadOptions::default();
        enrich(
            &MetadataOptions::default().without_checksum(),
            &FileInput::Bytes(Bytes::from_static(b"abc")),
            &mut upload,
        )
        .await
        .unwrap();
        assert!(!upload.metadata.contains_key("checksum"));
        assert!(!upload.metadata.contains_key("originalFilename"));
    }
}
