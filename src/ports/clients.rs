use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::{Metadata, UpstreamFailure};

/// Upload call against the media service's upload API
#[derive(Debug, Clone, PartialEq)]
pub struct CloudinaryUploadRequest {
    pub file: Bytes,
    /// Full public id, folder included, extension stripped
    pub public_id: String,
    /// `image`, `video`, `raw` or `auto`
    pub resource_type: String,
    pub content_type: String,
    pub filename: Option<String>,
    pub tags: Vec<String>,
    /// Stored as the asset's context (`key=value|...`)
    pub context: Metadata,
    /// Eager/incoming transformation string, e.g. `w_300,h_200,c_fill`
    pub transformation: Option<String>,
}

/// Asset description returned by the upload, resource and search APIs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudinaryResource {
    pub public_id: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub secure_url: Option<String>,
    /// RFC 3339 timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CloudinarySearchRequest {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// `[{"created_at": "desc"}]`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort_by: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub with_field: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CloudinarySearchResponse {
    #[serde(default)]
    pub resources: Vec<CloudinaryResource>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Port for the managed media service's HTTP API.
///
/// The adapter only talks to the service through this trait; failures come
/// back as [`UpstreamFailure`] and are classified by the adapter.
#[async_trait]
pub trait CloudinaryApi: Send + Sync + 'static {
    async fn upload(&self, request: CloudinaryUploadRequest)
        -> Result<CloudinaryResource, UpstreamFailure>;

    /// Returns the service's `result` field (`ok`, `not found`)
    async fn destroy(&self, public_id: &str, resource_type: &str) -> Result<String, UpstreamFailure>;

    async fn resource(
        &self,
        public_id: &str,
        resource_type: &str,
    ) -> Result<CloudinaryResource, UpstreamFailure>;

    async fn search(
        &self,
        request: CloudinarySearchRequest,
    ) -> Result<CloudinarySearchResponse, UpstreamFailure>;
}
