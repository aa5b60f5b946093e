use std::sync::Arc;
use tokio::sync::RwLock;

use super::{batch, pipeline};
use crate::{
    domain::{
        progress, BatchUploadOptions, ErrorKind, FileInput, MediaError, MediaResult,
        ProviderFeatures, SearchOptions, SearchResult, TransformationOptions, UploadOptions,
        UploadResult, DEFAULT_BATCH_CONCURRENCY,
    },
    plugins::{ErrorContext, Plugin},
    ports::MediaProvider,
};

/// Facade over one provider and an ordered list of plugins.
///
/// Every operation takes a snapshot of the plugin list when it starts, so a
/// plugin registered mid-flight only affects later operations.
pub struct Uploader {
    provider: Arc<dyn MediaProvider>,
    plugins: RwLock<Vec<Arc<Plugin>>>,
}

impl Uploader {
    pub fn new(provider: Arc<dyn MediaProvider>) -> Self {
        Self {
            provider,
            plugins: RwLock::new(Vec::new()),
        }
    }

    /// Register a plugin after running its init hook.
    ///
    /// Names are unique; a plugin whose init hook fails is not added.
    pub async fn use_plugin(&self, plugin: Plugin) -> MediaResult<()> {
        if self.has_plugin(&plugin.name).await {
            return Err(self.duplicate_plugin(&plugin.name));
        }

        if let Some(init) = &plugin.hooks.init {
            init().await?;
        }

        let mut plugins = self.plugins.write().await;
        if plugins.iter().any(|p| p.name == plugin.name) {
            return Err(self.duplicate_plugin(&plugin.name));
        }
        tracing::info!(
            plugin = %plugin.name,
            version = plugin.version.as_deref().unwrap_or("-"),
            provider = self.provider.name(),
            "Registered plugin"
        );
        plugins.push(Arc::new(plugin));
        Ok(())
    }

    pub async fn has_plugin(&self, name: &str) -> bool {
        self.plugins.read().await.iter().any(|p| p.name == name)
    }

    pub async fn plugin_names(&self) -> Vec<String> {
        self.plugins.read().await.iter().map(|p| p.name.clone()).collect()
    }

    fn duplicate_plugin(&self, name: &str) -> MediaError {
        MediaError::new(
            ErrorKind::InvalidConfig,
            self.provider.name(),
            format!("Plugin \"{}\" is already registered", name),
        )
    }

    async fn snapshot(&self) -> Vec<Arc<Plugin>> {
        self.plugins.read().await.clone()
    }

    pub async fn upload(&self, file: FileInput, options: UploadOptions) -> MediaResult<UploadResult> {
        let plugins = self.snapshot().await;
        self.upload_with(&plugins, file, options).await
    }

    async fn upload_with(
        &self,
        plugins: &[Arc<Plugin>],
        file: FileInput,
        options: UploadOptions,
    ) -> MediaResult<UploadResult> {
        let target = options
            .filename
            .clone()
            .or_else(|| file.name().map(str::to_string));

        match self.run_upload(plugins, file, options).await {
            Ok(result) => Ok(result),
            Err(error) => {
                tracing::debug!(provider = self.provider.name(), kind = %error.kind(), "Upload failed");
                pipeline::run_on_error(plugins, &error, &ErrorContext::upload(target)).await;
                Err(error)
            }
        }
    }

    async fn run_upload(
        &self,
        plugins: &[Arc<Plugin>],
        file: FileInput,
        options: UploadOptions,
    ) -> MediaResult<UploadResult> {
        let (file, mut options) = pipeline::run_before_upload(plugins, file, options).await?;
        options.on_progress = progress::monotonic(options.on_progress.take());

        let result = pipeline::with_retries(plugins, || {
            self.provider.upload(file.clone(), options.clone())
        })
        .await?;

        pipeline::run_after_upload(plugins, result).await
    }

    pub async fn delete(&self, id: &str) -> MediaResult<()> {
        let plugins = self.snapshot().await;
        self.delete_with(&plugins, id.to_string()).await
    }

    async fn delete_with(&self, plugins: &[Arc<Plugin>], id: String) -> MediaResult<()> {
        let context = ErrorContext::delete(id.as_str());
        match self.run_delete(plugins, id).await {
            Ok(()) => Ok(()),
            Err(error) => {
                pipeline::run_on_error(plugins, &error, &context).await;
                Err(error)
            }
        }
    }

    async fn run_delete(&self, plugins: &[Arc<Plugin>], id: String) -> MediaResult<()> {
        let id = pipeline::run_before_delete(plugins, id).await?;
        pipeline::with_retries(plugins, || self.provider.delete(&id)).await?;
        pipeline::run_after_delete(plugins, &id).await
    }

    /// Upload in windows of `options.concurrency`, each file going through
    /// the full plugin pipeline
    pub async fn upload_multiple(
        &self,
        files: Vec<FileInput>,
        options: BatchUploadOptions,
    ) -> MediaResult<Vec<UploadResult>> {
        let plugins = self.snapshot().await;
        tracing::debug!(
            provider = self.provider.name(),
            files = files.len(),
            concurrency = options.concurrency,
            "Batch upload"
        );
        batch::upload_in_windows(files, options, |file, options| {
            self.upload_with(&plugins, file, options)
        })
        .await
    }

    pub async fn delete_multiple(&self, ids: Vec<String>, concurrency: Option<usize>) -> MediaResult<()> {
        let plugins = self.snapshot().await;
        let plugins = plugins.as_slice();
        batch::delete_in_windows(
            self.provider.name(),
            ids,
            concurrency.unwrap_or(DEFAULT_BATCH_CONCURRENCY),
            |id| self.delete_with(plugins, id),
        )
        .await
    }

    pub async fn get(&self, id: &str) -> MediaResult<UploadResult> {
        self.provider.get(id).await
    }

    pub fn get_url(&self, id: &str, transformation: Option<&TransformationOptions>) -> MediaResult<String> {
        self.provider.get_url(id, transformation)
    }

    pub async fn search(&self, options: SearchOptions) -> MediaResult<SearchResult> {
        self.provider.search(options).await
    }

    /// Feature lookup by dotted path, e.g. `transformations.resize`
    pub fn supports(&self, path: &str) -> bool {
        self.provider.supports(path)
    }

    pub fn features(&self) -> &'static ProviderFeatures {
        self.provider.features()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn provider(&self) -> &Arc<dyn MediaProvider> {
        &self.provider
    }
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}
