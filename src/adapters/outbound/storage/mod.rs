// Infrastructure error mapping
pub mod error;

// Shared object_store plumbing
pub mod lazy;
pub mod object_store_adapter;

// Provider-specific implementations
pub mod memory;
pub mod r2;
pub mod s3;

// Re-export key types
pub use error::OBJECT_STORE_RULES;
pub use lazy::{ClientFactory, LazyClient};
pub use memory::{MemoryProvider, MEMORY_FEATURES};
pub use object_store_adapter::{ObjectStoreAdapter, StoredObject};
pub use r2::{R2Config, R2Provider, R2_FEATURES};
pub use s3::{S3Config, S3Provider, S3_FEATURES};
