use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{stream::FuturesUnordered, StreamExt, TryFutureExt};
use object_store::{
    path::Path as ObjectPath, Attribute, AttributeValue, Attributes, GetOptions, MultipartUpload,
    ObjectStore, PutMultipartOptions, PutOptions, PutPayload, TagSet,
};
use std::sync::Arc;

use super::error::OBJECT_STORE_RULES;
use super::lazy::LazyClient;
use crate::{
    adapters::outbound::detection::{resolve_content_type, MagicByteDetector},
    domain::{
        errors::{ErrorKind, MediaError, MediaResult, UpstreamFailure},
        models::{progress::ProgressTracker, FileInput, Metadata, UploadOptions, UploadResult},
        value_objects::ObjectKey,
    },
    ports::detection::FileTypeDetector,
};

/// Buffers above this size go through a multipart upload
pub const MULTIPART_THRESHOLD: usize = 5 * 1024 * 1024;

/// Size of every multipart part except the last
pub const PART_SIZE: usize = 5 * 1024 * 1024;

/// Parts uploaded concurrently during a multipart upload
pub const MAX_PARTS_IN_FLIGHT: usize = 4;

/// What an object-store backed provider knows about a stored object
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: ObjectKey,
    pub size: u64,
    pub content_type: Option<String>,
    pub format: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl StoredObject {
    pub fn into_result(self, provider: &str, url: String) -> UploadResult {
        UploadResult {
            id: self.key.into_string(),
            public_url: url.clone(),
            url,
            size: self.size,
            format: self.format,
            width: None,
            height: None,
            provider: provider.to_string(),
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}

/// Upload, read, and delete against any `object_store` backend.
///
/// Shared by every provider that speaks the S3 object API (and the in-memory
/// development backend). URL construction stays with the providers.
pub struct ObjectStoreAdapter {
    provider: &'static str,
    client: LazyClient<dyn ObjectStore>,
    detector: Arc<dyn FileTypeDetector>,
    detect_content_type: bool,
    multipart_threshold: usize,
}

impl ObjectStoreAdapter {
    pub fn new(provider: &'static str, client: LazyClient<dyn ObjectStore>) -> Self {
        Self {
            provider,
            client,
            detector: Arc::new(MagicByteDetector::new()),
            detect_content_type: false,
            multipart_threshold: MULTIPART_THRESHOLD,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn FileTypeDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Sniff content even when the caller declared a type
    pub fn with_content_detection(mut self, enabled: bool) -> Self {
        self.detect_content_type = enabled;
        self
    }

    pub fn with_multipart_threshold(mut self, threshold: usize) -> Self {
        self.multipart_threshold = threshold;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_initialized()
    }

    pub async fn put(&self, file: FileInput, options: &UploadOptions) -> MediaResult<StoredObject> {
        let key = ObjectKey::for_upload(
            options.folder.as_deref(),
            options.filename.as_deref(),
            options.unique_filename,
        )
        .map_err(|e| e.into_media_error(ErrorKind::UploadFailed, self.provider))?;

        let resolved = resolve_content_type(&file, self.detector.as_ref(), self.detect_content_type);
        let format = key
            .extension()
            .or(resolved.detected_ext)
            .unwrap_or_default();

        let tracker = ProgressTracker::new(options.on_progress.clone());
        tracker.start();

        let store = self.client.get().await?;
        let path = ObjectPath::from(key.as_str());
        let attributes = attributes_for(&resolved.mime, &options.metadata);
        let tags = tag_set(options.tags.iter());
        let data = file.bytes().clone();
        let size = data.len() as u64;

        tracing::debug!(
            provider = self.provider,
            key = %key,
            size,
            content_type = %resolved.mime,
            "Uploading object"
        );

        if data.len() > self.multipart_threshold {
            let opts = PutMultipartOptions {
                tags,
                attributes,
                ..Default::default()
            };
            self.put_multipart(store.as_ref(), &path, data, opts, &tracker)
                .await?;
        } else {
            let opts = PutOptions {
                tags,
                attributes,
                ..Default::default()
            };
            store
                .put_opts(&path, PutPayload::from(data), opts)
                .await
                .map_err(|e| self.classify(e, ErrorKind::UploadFailed))?;
        }

        tracker.complete();

        let mut metadata = options.metadata.clone();
        metadata.insert("contentType".into(), resolved.mime.clone().into());

        Ok(StoredObject {
            key,
            size,
            content_type: Some(resolved.mime),
            format,
            metadata,
            created_at: Utc::now(),
        })
    }

    /// Every part, the trailing partial one included, is sent through
    /// `put_part`; any failure up to and including `complete` aborts the
    /// upload so no partial object is left behind.
    async fn put_multipart(
        &self,
        store: &dyn ObjectStore,
        path: &ObjectPath,
        data: Bytes,
        opts: PutMultipartOptions,
        tracker: &ProgressTracker,
    ) -> MediaResult<()> {
        let mut upload = store
            .put_multipart_opts(path, opts)
            .await
            .map_err(|e| self.classify(e, ErrorKind::UploadFailed))?;
        let total = data.len() as u64;

        if let Err(e) = send_parts(upload.as_mut(), data, tracker).await {
            return Err(self.abort(upload.as_mut(), e).await);
        }

        tracing::debug!(provider = self.provider, path = %path, total, "Completed multipart upload");
        Ok(())
    }

    async fn abort(&self, upload: &mut dyn MultipartUpload, cause: object_store::Error) -> MediaError {
        if let Err(abort_err) = upload.abort().await {
            tracing::warn!(
                provider = self.provider,
                error = %abort_err,
                "Failed to abort multipart upload"
            );
        }
        self.classify(cause, ErrorKind::UploadFailed)
    }

    /// Read object metadata without the content
    pub async fn head(&self, id: &str) -> MediaResult<StoredObject> {
        let key = ObjectKey::new(id)
            .map_err(|e| e.into_media_error(ErrorKind::FileNotFound, self.provider))?;
        let store = self.client.get().await?;
        let path = ObjectPath::from(key.as_str());

        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = store
            .get_opts(&path, options)
            .await
            .map_err(|e| self.classify(e, ErrorKind::ProviderError))?;

        let mut metadata = Metadata::new();
        let mut content_type = None;
        for (attribute, value) in result.attributes.iter() {
            match attribute {
                Attribute::ContentType => content_type = Some(value.to_string()),
                Attribute::Metadata(name) => {
                    metadata.insert(name.to_string(), decode_metadata_value(value.as_ref()).into());
                }
                _ => {}
            }
        }
        if let Some(content_type) = &content_type {
            metadata.insert("contentType".into(), content_type.clone().into());
        }

        Ok(StoredObject {
            format: key.extension().unwrap_or_default(),
            key,
            size: result.meta.size,
            content_type,
            metadata,
            created_at: result.meta.last_modified,
        })
    }

    /// Delete an object; a missing object counts as deleted
    pub async fn delete(&self, id: &str) -> MediaResult<()> {
        let key = ObjectKey::new(id)
            .map_err(|e| e.into_media_error(ErrorKind::DeleteFailed, self.provider))?;
        let store = self.client.get().await?;
        let path = ObjectPath::from(key.as_str());

        match store.delete(&path).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(provider = self.provider, key = %key, "Object already absent");
                Ok(())
            }
            Err(e) => Err(self.classify(e, ErrorKind::DeleteFailed)),
        }
    }

    fn classify(&self, err: object_store::Error, fallback: ErrorKind) -> MediaError {
        UpstreamFailure::from(err).into_media_error(OBJECT_STORE_RULES, fallback, self.provider)
    }
}

impl std::fmt::Debug for ObjectStoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreAdapter")
            .field("provider", &self.provider)
            .field("client", &self.client)
            .field("detect_content_type", &self.detect_content_type)
            .finish()
    }
}

fn attributes_for(content_type: &str, metadata: &Metadata) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from(content_type.to_string()),
    );
    for (name, value) in metadata {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        attributes.insert(
            Attribute::Metadata(name.clone().into()),
            AttributeValue::from(urlencoding::encode(&value).into_owned()),
        );
    }
    attributes
}

/// Metadata travels as HTTP headers, which only carry visible ASCII
fn decode_metadata_value(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    }
}

/// Upload `data` in `PART_SIZE` chunks with at most `MAX_PARTS_IN_FLIGHT`
/// outstanding, then complete the upload
async fn send_parts(
    upload: &mut dyn MultipartUpload,
    data: Bytes,
    tracker: &ProgressTracker,
) -> object_store::Result<()> {
    let total = data.len() as u64;
    let mut in_flight = FuturesUnordered::new();
    let mut done = 0u64;
    let mut offset = 0;

    while offset < data.len() {
        if in_flight.len() >= MAX_PARTS_IN_FLIGHT {
            if let Some(sent) = in_flight.next().await {
                done += sent?;
                report_part(tracker, done, total);
            }
        }
        let end = (offset + PART_SIZE).min(data.len());
        let len = (end - offset) as u64;
        let part = upload.put_part(PutPayload::from(data.slice(offset..end)));
        in_flight.push(part.map_ok(move |()| len));
        offset = end;
    }

    while let Some(sent) = in_flight.next().await {
        done += sent?;
        report_part(tracker, done, total);
    }

    upload.complete().await?;
    Ok(())
}

/// 100% is only reported once the upload is complete
fn report_part(tracker: &ProgressTracker, done: u64, total: u64) {
    if done < total {
        tracker.report_bytes(done, total);
    }
}

fn tag_set<'a>(tags: impl Iterator<Item = &'a String>) -> TagSet {
    let mut set = TagSet::default();
    for tag in tags {
        set.push(tag, "");
    }
    set
}

/// Percent-encode every segment of a key for use in a URL path
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
