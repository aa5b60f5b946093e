//! Hook-based extensions run by the [`Uploader`](crate::services::Uploader)
//! around every provider call, plus the official plugins.

pub mod analytics;
pub mod metadata;
mod plugin;
pub mod retry;
pub mod validation;

pub use analytics::{AnalyticsEvent, AnalyticsSnapshot, UploadAnalytics};
pub use metadata::{metadata_plugin, ChecksumAlgorithm, MetadataOptions};
pub use plugin::*;
pub use retry::{retry_plugin, RetryOptions};
pub use validation::{validation_plugin, ValidationOptions};
