use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{
    client::HttpCloudinaryClient, errors::CLOUDINARY_RULES, url, CloudinaryConfig, PROVIDER_NAME,
};
use crate::{
    adapters::outbound::{
        detection::{resolve_content_type, MagicByteDetector},
        storage::lazy::{ClientFactory, LazyClient},
    },
    domain::{
        errors::{ErrorKind, MediaError, MediaResult, UpstreamFailure},
        models::{
            progress::ProgressTracker, CapabilityFeatures, FileInput, ProviderFeatures,
            SearchOptions, SearchResult, StorageLimits, TransformationFeatures,
            TransformationOptions, UploadOptions, UploadResult,
        },
        value_objects::ObjectKey,
    },
    ports::{
        clients::{CloudinaryApi, CloudinaryResource, CloudinarySearchRequest, CloudinaryUploadRequest},
        detection::FileTypeDetector,
        provider::MediaProvider,
    },
};

/// Resource types tried, in order, when an id is deleted or read
const RESOURCE_TYPES: [&str; 3] = ["image", "video", "raw"];

pub static CLOUDINARY_FEATURES: ProviderFeatures = ProviderFeatures {
    transformations: TransformationFeatures {
        resize: true,
        crop: true,
        format: true,
        quality: true,
        blur: true,
        rotate: true,
        effects: true,
    },
    capabilities: CapabilityFeatures {
        signed_uploads: true,
        direct_upload: true,
        multipart_upload: false,
        video_processing: true,
        ai_tagging: true,
        facial_detection: true,
    },
    storage: StorageLimits {
        max_file_size: 100 * 1024 * 1024,
        supported_formats: &[
            "jpg", "jpeg", "png", "gif", "webp", "avif", "heic", "bmp", "tif", "tiff", "ico",
            "svg", "pdf", "mp4", "mov", "webm", "avi", "mkv", "mp3", "wav", "ogg", "flac",
        ],
    },
};

/// Media provider backed by the Cloudinary upload and Admin APIs
pub struct CloudinaryProvider {
    config: CloudinaryConfig,
    api: LazyClient<dyn CloudinaryApi>,
    detector: Arc<dyn FileTypeDetector>,
}

impl CloudinaryProvider {
    /// Validate the configuration. The HTTP client is built on first use.
    pub fn new(config: CloudinaryConfig) -> MediaResult<Self> {
        config.validate()?;

        let client_config = config.clone();
        let api: LazyClient<dyn CloudinaryApi> = LazyClient::from_fn(move || {
            let config = client_config.clone();
            async move {
                HttpCloudinaryClient::new(&config).map(|client| Arc::new(client) as Arc<dyn CloudinaryApi>)
            }
        });

        Ok(Self::with_client(config, api))
    }

    /// Talk to `api` instead of the HTTP client
    pub fn with_api(config: CloudinaryConfig, api: Arc<dyn CloudinaryApi>) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self::with_client(config, LazyClient::ready(api)))
    }

    pub fn with_api_factory(
        config: CloudinaryConfig,
        factory: ClientFactory<dyn CloudinaryApi>,
    ) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self::with_client(config, LazyClient::new(factory)))
    }

    fn with_client(config: CloudinaryConfig, api: LazyClient<dyn CloudinaryApi>) -> Self {
        Self {
            config,
            api,
            detector: Arc::new(MagicByteDetector::new()),
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn FileTypeDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    fn delivery_url(
        &self,
        resource_type: &str,
        public_id: &str,
        transformation: Option<&TransformationOptions>,
    ) -> String {
        url::delivery_url(
            self.config.cloud_name.trim(),
            resource_type,
            public_id,
            transformation,
            self.config.secure,
        )
    }

    fn to_result(&self, resource: CloudinaryResource, mut metadata: Map<String, Value>) -> UploadResult {
        let resource_type = if resource.resource_type.is_empty() {
            "image".to_string()
        } else {
            resource.resource_type.clone()
        };
        let url = resource
            .secure_url
            .clone()
            .or_else(|| resource.url.clone())
            .unwrap_or_else(|| self.delivery_url(&resource_type, &resource.public_id, None));
        let created_at = resource
            .created_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        metadata.insert("resourceType".into(), resource_type.into());
        if !resource.tags.is_empty() {
            metadata.insert("tags".into(), resource.tags.clone().into());
        }

        UploadResult {
            id: resource.public_id,
            public_url: url.clone(),
            url,
            size: resource.bytes,
            format: resource.format.unwrap_or_default().to_ascii_lowercase(),
            width: resource.width,
            height: resource.height,
            provider: PROVIDER_NAME.to_string(),
            metadata,
            created_at,
        }
    }

    fn search_expression(options: &SearchOptions) -> String {
        let mut clauses = Vec::new();
        if let Some(expression) = options.expression.as_deref().filter(|e| !e.trim().is_empty()) {
            clauses.push(format!("({})", expression));
        }
        if let Some(folder) = options.folder.as_deref().map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
            clauses.push(format!("folder=\"{}\"", folder));
        }
        for tag in &options.tags {
            clauses.push(format!("tags=\"{}\"", tag));
        }
        clauses.join(" AND ")
    }
}

#[async_trait]
impl MediaProvider for CloudinaryProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn features(&self) -> &'static ProviderFeatures {
        &CLOUDINARY_FEATURES
    }

    async fn upload(&self, file: FileInput, options: UploadOptions) -> MediaResult<UploadResult> {
        // Public ids carry no extension: the service derives the delivered
        // format itself. This applies with or without `unique_filename`, so
        // "avatar.png" is stored as "avatar".
        let public_id = ObjectKey::for_upload(
            options.folder.as_deref(),
            options.filename.as_deref(),
            options.unique_filename,
        )
        .map_err(|e| e.into_media_error(ErrorKind::UploadFailed, PROVIDER_NAME))?
        .without_extension();

        let resolved = resolve_content_type(&file, self.detector.as_ref(), self.config.detect_content_type);
        let tracker = ProgressTracker::new(options.on_progress.clone());
        tracker.start();

        let api = self.api.get().await?;
        let request = CloudinaryUploadRequest {
            file: file.bytes().clone(),
            public_id: public_id.as_str().to_string(),
            resource_type: "auto".to_string(),
            content_type: resolved.mime,
            filename: file.name().map(str::to_string),
            tags: options.tags.iter().cloned().collect(),
            context: options.metadata.clone(),
            transformation: options
                .transformation
                .as_ref()
                .and_then(url::transformation_segment),
        };

        tracing::debug!(
            provider = PROVIDER_NAME,
            public_id = %public_id,
            size = file.size(),
            "Uploading asset"
        );

        let resource = api.upload(request).await.map_err(|failure| {
            failure.into_media_error(CLOUDINARY_RULES, ErrorKind::UploadFailed, PROVIDER_NAME)
        })?;

        tracker.complete();
        Ok(self.to_result(resource, options.metadata))
    }

    async fn delete(&self, id: &str) -> MediaResult<()> {
        let api = self.api.get().await?;
        for resource_type in RESOURCE_TYPES {
            let outcome = api.destroy(id, resource_type).await.map_err(|failure| {
                failure.into_media_error(CLOUDINARY_RULES, ErrorKind::DeleteFailed, PROVIDER_NAME)
            })?;
            match outcome.as_str() {
                "ok" => {
                    tracing::debug!(provider = PROVIDER_NAME, id, resource_type, "Deleted asset");
                    return Ok(());
                }
                "not found" => continue,
                other => {
                    return Err(MediaError::new(
                        ErrorKind::DeleteFailed,
                        PROVIDER_NAME,
                        format!("Failed to delete {}: {}", id, other),
                    )
                    .with_detail("result", other)
                    .with_detail("resourceType", resource_type))
                }
            }
        }
        tracing::debug!(provider = PROVIDER_NAME, id, "Asset already absent");
        Ok(())
    }

    async fn get(&self, id: &str) -> MediaResult<UploadResult> {
        let api = self.api.get().await?;
        let mut last_failure = None;
        for resource_type in RESOURCE_TYPES {
            match api.resource(id, resource_type).await {
                Ok(resource) => return Ok(self.to_result(resource, Map::new())),
                Err(failure) if failure.status_is(404) => last_failure = Some(failure),
                Err(failure) => {
                    return Err(failure.into_media_error(
                        CLOUDINARY_RULES,
                        ErrorKind::ProviderError,
                        PROVIDER_NAME,
                    ))
                }
            }
        }

        let failure = last_failure
            .unwrap_or_else(|| UpstreamFailure::new(format!("Resource not found - {}", id)));
        Err(failure.into_media_error(CLOUDINARY_RULES, ErrorKind::FileNotFound, PROVIDER_NAME))
    }

    fn get_url(
        &self,
        id: &str,
        transformation: Option<&TransformationOptions>,
    ) -> MediaResult<String> {
        Ok(self.delivery_url("image", id, transformation))
    }

    async fn search(&self, options: SearchOptions) -> MediaResult<SearchResult> {
        let api = self.api.get().await?;
        let sort_by = options
            .sort_by
            .as_ref()
            .map(|field| {
                let mut sort = Map::new();
                sort.insert(field.clone(), Value::from("desc"));
                vec![sort]
            })
            .unwrap_or_default();

        let request = CloudinarySearchRequest {
            expression: Self::search_expression(&options),
            max_results: options.max_results,
            next_cursor: options.next_cursor.clone(),
            sort_by,
            with_field: vec!["tags".to_string()],
        };

        let response = api.search(request).await.map_err(|failure| {
            failure.into_media_error(CLOUDINARY_RULES, ErrorKind::ProviderError, PROVIDER_NAME)
        })?;

        Ok(SearchResult {
            resources: response
                .resources
                .into_iter()
                .map(|resource| self.to_result(resource, Map::new()))
                .collect(),
            total_count: response.total_count,
            next_cursor: response.next_cursor,
        })
    }
}

impl std::fmt::Debug for CloudinaryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryProvider")
            .field("cloud_name", &self.config.cloud_name)
            .field("secure", &self.config.secure)
            .field("connected", &self.api.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Fit;

    fn provider() -> CloudinaryProvider {
        let config = CloudinaryConfig::builder()
            .cloud_name("demo")
            .api_key("123")
            .api_secret("cld-secret")
            .build();
        CloudinaryProvider::new(config).unwrap()
    }

    #[test]
    fn test_get_url_maps_transformations() {
        let t = TransformationOptions::resize(300, 200).with_fit(Fit::Cover);
        assert_eq!(
            provider().get_url("users/avatar", Some(&t)).unwrap(),
            "https://res.cloudinary.com/demo/image/upload/w_300,h_200,c_fill/users/avatar"
        );
    }

    #[test]
    fn test_search_expression() {
        let options = SearchOptions::expression("resource_type:image")
            .in_folder("/users/")
            .with_tag("profile");
        assert_eq!(
            CloudinaryProvider::search_expression(&options),
            "(resource_type:image) AND folder=\"users\" AND tags=\"profile\""
        );
        assert_eq!(CloudinaryProvider::search_expression(&SearchOptions::default()), "");
    }

    #[test]
    fn test_debug_is_redacted() {
        let printed = format!("{:?}", provider());
        assert!(!printed.contains("cld-secret"));
        assert!(printed.contains("connected: false"));
    }

    #[test]
    fn test_features() {
        let p = provider();
        assert!(p.supports("transformations.resize"));
        assert!(p.supports("capabilities.aiTagging"));
        assert!(!p.supports("capabilities.multipartUpload"));
        assert!(p.supports("storage.supportedFormats.webp"));
    }
}
