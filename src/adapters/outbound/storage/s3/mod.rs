//! S3 storage provider built on the object_store crate

mod s3_provider;

pub use s3_provider::{S3Provider, S3_FEATURES};

use bon::Builder;
use object_store::{aws::AmazonS3Builder, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::{
    errors::{ErrorKind, MediaError, MediaResult, ValidationError},
    value_objects::{BucketName, Credential},
};

/// Configuration for the S3 provider
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    #[builder(into)]
    pub bucket: String,
    #[builder(into)]
    pub region: String,
    #[builder(into)]
    #[serde(skip_serializing)]
    pub access_key: Credential,
    #[builder(into)]
    #[serde(skip_serializing)]
    pub secret_key: Credential,
    /// Custom S3-compatible endpoint, addressed path-style
    #[builder(into)]
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Base URL objects are publicly served from (CDN, website bucket)
    #[builder(into)]
    #[serde(default)]
    pub public_url: Option<String>,
    /// Sniff content types even when the caller declares one
    #[builder(default)]
    #[serde(default)]
    pub detect_content_type: bool,
}

impl S3Config {
    pub fn validate(&self) -> MediaResult<()> {
        let provider = s3_provider::PROVIDER_NAME;
        validate_bucket(provider, &self.bucket)?;
        if self.region.trim().is_empty() {
            return Err(invalid(provider, ValidationError::MissingField("region")));
        }
        if let Some(endpoint) = &self.endpoint {
            validate_url(provider, "endpoint", endpoint)?;
        }
        if let Some(public_url) = &self.public_url {
            validate_url(provider, "publicUrl", public_url)?;
        }
        validate_credentials(provider, &self.access_key, &self.secret_key)
    }
}

/// Connection settings shared by every S3-compatible provider
pub(crate) struct S3Connection<'a> {
    pub bucket: &'a str,
    pub region: &'a str,
    pub access_key: &'a Credential,
    pub secret_key: &'a Credential,
    pub endpoint: Option<&'a str>,
}

/// Create an S3-compatible store
pub(crate) fn create_s3_store(
    provider: &'static str,
    connection: S3Connection<'_>,
) -> MediaResult<Arc<dyn ObjectStore>> {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(connection.bucket)
        .with_region(connection.region)
        .with_access_key_id(connection.access_key.expose())
        .with_secret_access_key(connection.secret_key.expose());

    if let Some(endpoint) = connection.endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_virtual_hosted_style_request(false)
            .with_allow_http(endpoint.starts_with("http://"));
    }

    let store = builder.build().map_err(|e| {
        MediaError::invalid_config(provider, format!("Failed to build {} client: {}", provider, e))
            .with_cause(e)
    })?;

    tracing::info!(provider, bucket = connection.bucket, "Constructed object store client");
    Ok(Arc::new(store))
}

pub(crate) fn invalid(provider: &str, error: ValidationError) -> MediaError {
    error.into_media_error(ErrorKind::InvalidConfig, provider)
}

pub(crate) fn validate_bucket(provider: &str, bucket: &str) -> MediaResult<()> {
    if bucket.trim().is_empty() {
        return Err(invalid(provider, ValidationError::MissingField("bucket")));
    }
    BucketName::new(bucket)
        .map(|_| ())
        .map_err(|e| invalid(provider, e).with_detail("field", "bucket"))
}

pub(crate) fn validate_url(provider: &str, field: &str, value: &str) -> MediaResult<()> {
    if value.starts_with("https://") || value.starts_with("http://") {
        return Ok(());
    }
    Err(invalid(
        provider,
        ValidationError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
            expected: "an http(s) URL".to_string(),
        },
    ))
}

pub(crate) fn validate_credentials(
    provider: &str,
    access_key: &Credential,
    secret_key: &Credential,
) -> MediaResult<()> {
    if access_key.is_blank() {
        return Err(MediaError::missing_credentials(provider, "accessKeyId"));
    }
    if secret_key.is_blank() {
        return Err(MediaError::missing_credentials(provider, "secretAccessKey"));
    }
    Ok(())
}
