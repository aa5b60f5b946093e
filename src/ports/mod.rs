pub mod clients;
pub mod detection;
pub mod provider;

// Re-export all port traits for convenience
pub use clients::{
    CloudinaryApi, CloudinaryResource, CloudinarySearchRequest, CloudinarySearchResponse,
    CloudinaryUploadRequest,
};
pub use detection::{FileType, FileTypeDetector};
pub use provider::MediaProvider;
