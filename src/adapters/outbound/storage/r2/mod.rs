//! Cloudflare R2 provider, an S3-compatible store addressed per account

mod r2_provider;

pub use r2_provider::{R2Provider, R2_FEATURES};

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::s3::{invalid, validate_bucket, validate_credentials, validate_url};
use crate::domain::{errors::MediaResult, errors::ValidationError, value_objects::Credential};

/// Configuration for the R2 provider
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct R2Config {
    #[builder(into)]
    pub account_id: String,
    #[builder(into)]
    pub bucket: String,
    #[builder(into)]
    #[serde(skip_serializing)]
    pub access_key: Credential,
    #[builder(into)]
    #[serde(skip_serializing)]
    pub secret_key: Credential,
    /// Public bucket or custom domain URL; required by `get_url`
    #[builder(into)]
    #[serde(default)]
    pub public_url: Option<String>,
    #[builder(default)]
    #[serde(default)]
    pub detect_content_type: bool,
}

impl R2Config {
    pub fn validate(&self) -> MediaResult<()> {
        let provider = r2_provider::PROVIDER_NAME;
        let account_id = self.account_id.trim();
        if account_id.is_empty() {
            return Err(invalid(provider, ValidationError::MissingField("accountId")));
        }
        if !account_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid(
                provider,
                ValidationError::InvalidField {
                    field: "accountId".to_string(),
                    value: self.account_id.clone(),
                    expected: "alphanumeric account id".to_string(),
                },
            ));
        }
        validate_bucket(provider, &self.bucket)?;
        if let Some(public_url) = &self.public_url {
            validate_url(provider, "publicUrl", public_url)?;
        }
        validate_credentials(provider, &self.access_key, &self.secret_key)
    }

    /// `https://<account>.r2.cloudflarestorage.com`
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id.trim())
    }
}
