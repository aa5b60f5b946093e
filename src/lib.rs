pub mod adapters;
pub mod app;
pub mod domain;
pub mod plugins;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - inputs, results, features and errors
pub use domain::{
    BatchProgress, BatchUploadOptions, Credential, ErrorKind, FileHandle, FileInput, Fit,
    MediaError, MediaResult, Metadata, ObjectKey, ProgressCallback, ProviderFeatures,
    SearchOptions, SearchResult, TransformationOptions, UploadOptions, UploadResult,
};

// Port types - the provider contract and its collaborators
pub use ports::{CloudinaryApi, FileType, FileTypeDetector, MediaProvider};

// Providers
pub use adapters::outbound::{
    detection::MagicByteDetector,
    media::{CloudinaryConfig, CloudinaryProvider},
    storage::{MemoryProvider, R2Config, R2Provider, S3Config, S3Provider},
};

// Plugins
pub use plugins::{create_plugin, Plugin, PluginHooks, PluginOptions};

// Uploader facade and factories
pub use app::{create_provider, create_uploader, create_uploader_from_env, ProviderConfig, UploaderBuilder};
pub use services::Uploader;

pub mod prelude {
    pub use crate::{
        create_plugin, create_provider, create_uploader, BatchUploadOptions, ErrorKind, FileHandle,
        FileInput, MediaError, MediaProvider, MediaResult, Plugin, PluginHooks, PluginOptions,
        ProviderConfig, SearchOptions, TransformationOptions, UploadOptions, UploadResult,
        Uploader, UploaderBuilder,
    };
}
