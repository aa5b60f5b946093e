use async_trait::async_trait;
use object_store::ObjectStore;
use std::sync::Arc;

use super::R2Config;
use crate::{
    adapters::outbound::storage::{
        lazy::{ClientFactory, LazyClient},
        object_store_adapter::{encode_key, ObjectStoreAdapter},
        s3::{create_s3_store, S3Connection},
    },
    domain::{
        errors::{MediaError, MediaResult},
        models::{
            CapabilityFeatures, FileInput, ProviderFeatures, StorageLimits, TransformationFeatures,
            TransformationOptions, UploadOptions, UploadResult,
        },
    },
    ports::{detection::FileTypeDetector, provider::MediaProvider},
};

pub(crate) const PROVIDER_NAME: &str = "r2";

/// R2 signs requests for this pseudo-region
const R2_REGION: &str = "auto";

pub static R2_FEATURES: ProviderFeatures = ProviderFeatures {
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
        max_file_size: 5 * 1024 * 1024 * 1024 * 1024,
        supported_formats: &["*"],
    },
};

/// Media provider backed by a Cloudflare R2 bucket
pub struct R2Provider {
    config: R2Config,
    store: ObjectStoreAdapter,
}

impl R2Provider {
    pub fn new(config: R2Config) -> MediaResult<Self> {
        config.validate()?;

        let connection_config = config.clone();
        let client: LazyClient<dyn ObjectStore> = LazyClient::from_fn(move || {
            let config = connection_config.clone();
            async move {
                let endpoint = config.endpoint();
                create_s3_store(
                    PROVIDER_NAME,
                    S3Connection {
                        bucket: &config.bucket,
                        region: R2_REGION,
                        access_key: &config.access_key,
                        secret_key: &config.secret_key,
                        endpoint: Some(&endpoint),
                    },
                )
            }
        });

        Ok(Self::with_client(config, client))
    }

    pub fn with_store_factory(
        config: R2Config,
        factory: ClientFactory<dyn ObjectStore>,
    ) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self::with_client(config, LazyClient::new(factory)))
    }

    fn with_client(config: R2Config, client: LazyClient<dyn ObjectStore>) -> Self {
        let store = ObjectStoreAdapter::new(PROVIDER_NAME, client)
            .with_content_detection(config.detect_content_type);
        Self { config, store }
    }

    pub fn with_detector(mut self, detector: Arc<dyn FileTypeDetector>) -> Self {
        self.store = self.store.with_detector(detector);
        self
    }

    pub fn config(&self) -> &R2Config {
        &self.config
    }

    fn public_object_url(&self, key: &str) -> Option<String> {
        self.config
            .public_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), encode_key(key)))
    }

    /// Public URL when configured, otherwise the (private) storage URL
    fn result_url(&self, key: &str) -> String {
        self.public_object_url(key).unwrap_or_else(|| {
            format!(
                "{}/{}/{}",
                self.config.endpoint(),
                self.config.bucket,
                encode_key(key)
            )
        })
    }
}

#[async_trait]
impl MediaProvider for R2Provider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn features(&self) -> &'static ProviderFeatures {
        &R2_FEATURES
    }

    async fn upload(&self, file: FileInput, options: UploadOptions) -> MediaResult<UploadResult> {
        if options.transformation.as_ref().is_some_and(|t| !t.is_empty()) {
            tracing::warn!(provider = PROVIDER_NAME, "Transformations are not supported; uploading original");
        }
        let stored = self.store.put(file, &options).await?;
        let url = self.result_url(stored.key.as_str());
        Ok(stored.into_result(PROVIDER_NAME, url))
    }

    async fn delete(&self, id: &str) -> MediaResult<()> {
        self.store.delete(id).await
    }

    async fn get(&self, id: &str) -> MediaResult<UploadResult> {
        let stored = self.store.head(id).await?;
        let url = self.result_url(stored.key.as_str());
        Ok(stored.into_result(PROVIDER_NAME, url))
    }

    fn get_url(
        &self,
        id: &str,
        transformation: Option<&TransformationOptions>,
    ) -> MediaResult<String> {
        let url = self.public_object_url(id).ok_or_else(|| {
            MediaError::invalid_config(
                PROVIDER_NAME,
                "A public URL must be configured to build R2 object URLs",
            )
            .with_detail("field", "publicUrl")
        })?;
        if transformation.is_some_and(|t| !t.is_empty()) {
            tracing::warn!(
                provider = PROVIDER_NAME,
                id,
                "Transformations are not supported; returning the original URL"
            );
        }
        Ok(url)
    }
}

impl std::fmt::Debug for R2Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R2Provider")
            .field("account_id", &self.config.account_id)
            .field("bucket", &self.config.bucket)
            .field("public_url", &self.config.public_url)
            .field("connected", &self.store.is_connected())
            .finish()
    }
}
