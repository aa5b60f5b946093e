use async_trait::async_trait;
use object_store::ObjectStore;
use std::sync::Arc;

use super::{create_s3_store, S3Config, S3Connection};
use crate::{
    adapters::outbound::storage::{
        lazy::{ClientFactory, LazyClient},
        object_store_adapter::{encode_key, ObjectStoreAdapter},
    },
    domain::{
        errors::MediaResult,
        models::{
            CapabilityFeatures, FileInput, ProviderFeatures, StorageLimits, TransformationFeatures,
            TransformationOptions, UploadOptions, UploadResult,
        },
    },
    ports::{detection::FileTypeDetector, provider::MediaProvider},
};

pub(crate) const PROVIDER_NAME: &str = "s3";

pub static S3_FEATURES: ProviderFeatures = ProviderFeatures {
    transformations: TransformationFeatures {
        resize: false,
        crop: false,
        format: false,
        quality: false,
        blur: false,
        rotate: false,
        effects: false,
    },
    capabilities: CapabilityFeatures {
        signed_uploads: true,
        direct_upload: true,
        multipart_upload: true,
        video_processing: false,
        ai_tagging: false,
        facial_detection: false,
    },
    storage: StorageLimits {
        // 5 TiB
        max_file_size: 5 * 1024 * 1024 * 1024 * 1024,
        supported_formats: &["*"],
    },
};

/// Media provider backed by an S3 bucket
pub struct S3Provider {
    config: S3Config,
    store: ObjectStoreAdapter,
}

impl S3Provider {
    /// Validate the configuration. The S3 client itself is built on first use.
    pub fn new(config: S3Config) -> MediaResult<Self> {
        config.validate()?;

        let connection_config = config.clone();
        let client: LazyClient<dyn ObjectStore> = LazyClient::from_fn(move || {
            let config = connection_config.clone();
            async move {
                create_s3_store(
                    PROVIDER_NAME,
                    S3Connection {
                        bucket: &config.bucket,
                        region: &config.region,
                        access_key: &config.access_key,
                        secret_key: &config.secret_key,
                        endpoint: config.endpoint.as_deref(),
                    },
                )
            }
        });

        Ok(Self::with_client(config, client))
    }

    /// Use `factory` instead of the S3 client, e.g. an in-memory store
    pub fn with_store_factory(
        config: S3Config,
        factory: ClientFactory<dyn ObjectStore>,
    ) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self::with_client(config, LazyClient::new(factory)))
    }

    fn with_client(config: S3Config, client: LazyClient<dyn ObjectStore>) -> Self {
        let store = ObjectStoreAdapter::new(PROVIDER_NAME, client)
            .with_content_detection(config.detect_content_type);
        Self { config, store }
    }

    pub fn with_detector(mut self, detector: Arc<dyn FileTypeDetector>) -> Self {
        self.store = self.store.with_detector(detector);
        self
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Public URL, then path-style custom endpoint, then the AWS
    /// virtual-hosted URL
    fn object_url(&self, key: &str) -> String {
        let key = encode_key(key);
        if let Some(public_url) = &self.config.public_url {
            return format!("{}/{}", public_url.trim_end_matches('/'), key);
        }
        if let Some(endpoint) = &self.config.endpoint {
            return format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.config.bucket,
                key
            );
        }
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.config.bucket, self.config.region, key
        )
    }
}

#[async_trait]
impl MediaProvider for S3Provider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn features(&self) -> &'static ProviderFeatures {
        &S3_FEATURES
    }

    async fn upload(&self, file: FileInput, options: UploadOptions) -> MediaResult<UploadResult> {
        if options.transformation.as_ref().is_some_and(|t| !t.is_empty()) {
            tracing::warn!(provider = PROVIDER_NAME, "Transformations are not supported; uploading original");
        }
        let stored = self.store.put(file, &options).await?;
        let url = self.object_url(stored.key.as_str());
        Ok(stored.into_result(PROVIDER_NAME, url))
    }

    async fn delete(&self, id: &str) -> MediaResult<()> {
        self.store.delete(id).await
    }

    async fn get(&self, id: &str) -> MediaResult<UploadResult> {
        let stored = self.store.head(id).await?;
        let url = self.object_url(stored.key.as_str());
        Ok(stored.into_result(PROVIDER_NAME, url))
    }

    fn get_url(
        &self,
        id: &str,
        transformation: Option<&TransformationOptions>,
    ) -> MediaResult<String> {
        if transformation.is_some_and(|t| !t.is_empty()) {
            tracing::warn!(
                provider = PROVIDER_NAME,
                id,
                "Transformations are not supported; returning the original URL"
            );
        }
        Ok(self.object_url(id))
    }
}

impl std::fmt::Debug for S3Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Provider")
            .field("bucket", &self.config.bucket)
            .field("region", &self.config.region)
            .field("endpoint", &self.config.endpoint)
            .field("public_url", &self.config.public_url)
            .field("connected", &self.store.is_connected())
            .finish()
    }
}
