use async_trait::async_trait;
use object_store::{memory::InMemory, ObjectStore};
use std::sync::Arc;

use super::{
    lazy::LazyClient,
    object_store_adapter::{encode_key, ObjectStoreAdapter},
};
use crate::{
    domain::{
        errors::MediaResult,
        models::{
            CapabilityFeatures, FileInput, ProviderFeatures, StorageLimits, TransformationFeatures,
            TransformationOptions, UploadOptions, UploadResult,
        },
    },
    ports::{detection::FileTypeDetector, provider::MediaProvider},
};

const PROVIDER_NAME: &str = "memory";

pub static MEMORY_FEATURES: ProviderFeatures = ProviderFeatures {
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
        signed_uploads: false,
        direct_upload: false,
        multipart_upload: true,
        video_processing: false,
        ai_tagging: false,
        facial_detection: false,
    },
    storage: StorageLimits {
        max_file_size: 1024 * 1024 * 1024,
        supported_formats: &["*"],
    },
};

/// In-process provider for development and tests. Objects live as long as
/// the provider.
pub struct MemoryProvider {
    store: ObjectStoreAdapter,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemory::new()))
    }

    /// Share an existing store, e.g. to inspect it from a test
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store: ObjectStoreAdapter::new(PROVIDER_NAME, LazyClient::ready(store)),
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn FileTypeDetector>) -> Self {
        self.store = self.store.with_detector(detector);
        self
    }

    fn object_url(key: &str) -> String {
        format!("memory://{}", encode_key(key))
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn features(&self) -> &'static ProviderFeatures {
        &MEMORY_FEATURES
    }

    async fn upload(&self, file: FileInput, options: UploadOptions) -> MediaResult<UploadResult> {
        let stored = self.store.put(file, &options).await?;
        let url = Self::object_url(stored.key.as_str());
        Ok(stored.into_result(PROVIDER_NAME, url))
    }

    async fn delete(&self, id: &str) -> MediaResult<()> {
        self.store.delete(id).await
    }

    async fn get(&self, id: &str) -> MediaResult<UploadResult> {
        let stored = self.store.head(id).await?;
        let url = Self::object_url(stored.key.as_str());
        Ok(stored.into_result(PROVIDER_NAME, url))
    }

    fn get_url(
        &self,
        id: &str,
        _transformation: Option<&TransformationOptions>,
    ) -> MediaResult<String> {
        Ok(Self::object_url(id))
    }
}

impl std::fmt::Debug for MemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryProvider").finish()
    }
}
