use async_trait::async_trait;

use crate::domain::{
    BatchUploadOptions, FileInput, MediaError, MediaResult, ProviderFeatures, SearchOptions,
    SearchResult, TransformationOptions, UploadOptions, UploadResult,
};
use crate::services::batch;

/// Port for a media backend.
///
/// Every implementation normalizes its backend into [`UploadResult`] and the
/// shared error taxonomy. Ids returned by `upload` are accepted unchanged by
/// `delete`, `get` and `get_url` of the same provider.
#[async_trait]
pub trait MediaProvider: Send + Sync + 'static {
    /// Adapter name literal, e.g. `"s3"`
    fn name(&self) -> &'static str;

    /// Static capability matrix of this provider type
    fn features(&self) -> &'static ProviderFeatures;

    /// Store one file
    async fn upload(&self, file: FileInput, options: UploadOptions) -> MediaResult<UploadResult>;

    /// Remove an object. Deleting a missing object succeeds.
    async fn delete(&self, id: &str) -> MediaResult<()>;

    /// Read object metadata without downloading the content
    async fn get(&self, id: &str) -> MediaResult<UploadResult>;

    /// Public URL for an object. Never performs I/O.
    fn get_url(
        &self,
        id: &str,
        transformation: Option<&TransformationOptions>,
    ) -> MediaResult<String>;

    /// Upload several files in bounded concurrent windows, preserving order
    async fn upload_multiple(
        &self,
        files: Vec<FileInput>,
        options: BatchUploadOptions,
    ) -> MediaResult<Vec<UploadResult>> {
        batch::upload_in_windows(files, options, |file, options| self.upload(file, options)).await
    }

    /// Delete several objects; failures are aggregated into one error
    async fn delete_multiple(&self, ids: Vec<String>, concurrency: usize) -> MediaResult<()> {
        batch::delete_in_windows(self.name(), ids, concurrency, |id| async move {
            self.delete(&id).await
        })
        .await
    }

    /// Query stored assets. Unsupported unless the provider overrides it.
    async fn search(&self, options: SearchOptions) -> MediaResult<SearchResult> {
        let _ = options;
        Err(MediaError::unsupported(self.name(), "search"))
    }

    /// Whether the provider reports the dotted feature path as enabled
    fn supports(&self, path: &str) -> bool {
        self.features().supports(path)
    }
}
