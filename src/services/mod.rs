pub mod batch;
pub mod pipeline;
mod uploader;

pub use uploader::Uploader;
