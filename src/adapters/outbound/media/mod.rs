// Managed media-transformation services
pub mod cloudinary;

pub use cloudinary::{CloudinaryConfig, CloudinaryProvider, HttpCloudinaryClient, CLOUDINARY_FEATURES};
