use async_trait::async_trait;
use http::StatusCode;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{CloudinaryConfig, PROVIDER_NAME};
use crate::{
    domain::{
        errors::{MediaError, MediaResult, UpstreamFailure},
        value_objects::Credential,
    },
    ports::clients::{
        CloudinaryApi, CloudinaryResource, CloudinarySearchRequest, CloudinarySearchResponse,
        CloudinaryUploadRequest,
    },
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// reqwest implementation of the media API.
///
/// Upload and destroy calls are signed with SHA-256; Admin API calls
/// (resource, search) use basic auth.
pub struct HttpCloudinaryClient {
    http: Client,
    base_url: String,
    cloud_name: String,
    api_key: Credential,
    api_secret: Credential,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DestroyBody {
    result: String,
}

impl HttpCloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                MediaError::invalid_config(PROVIDER_NAME, "Failed to create HTTP client").with_cause(e)
            })?;

        tracing::info!(cloud_name = %config.cloud_name, "Constructed media API client");

        Ok(Self {
            http,
            base_url: config.api_base_url().to_string(),
            cloud_name: config.cloud_name.trim().to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.cloud_name, path)
    }

    /// Sign the request parameters: sorted `k=v` pairs joined by `&`, the
    /// secret appended, SHA-256 hex digest
    fn sign(&self, params: &BTreeMap<&'static str, String>) -> String {
        sign_params(params, self.api_secret.expose())
    }

    fn signed_params(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.retain(|_, v| !v.is_empty());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = self.sign(&params);
        params.insert("signature", signature);
        params.insert("signature_algorithm", "sha256".to_string());
        params.insert("api_key", self.api_key.expose().to_string());
        params
    }

    fn admin(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(self.api_key.expose(), Some(self.api_secret.expose()))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, UpstreamFailure> {
        let response = request.send().await.map_err(transport_failure)?;
        parse_response(response).await
    }
}

fn sign_params(params: &BTreeMap<&'static str, String>, secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn transport_failure(err: reqwest::Error) -> UpstreamFailure {
    if err.is_timeout() || err.is_connect() {
        return UpstreamFailure::network(err.to_string());
    }
    match err.status() {
        Some(status) => match StatusCode::from_u16(status.as_u16()) {
            Ok(status) => UpstreamFailure::http(status, err.to_string()),
            Err(_) => UpstreamFailure::new(err.to_string()),
        },
        None => UpstreamFailure::new(err.to_string()),
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamFailure> {
    let status = StatusCode::from_u16(response.status().as_u16()).ok();
    let success = response.status().is_success();
    let body = response.text().await.map_err(transport_failure)?;

    if !success {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);
        let mut failure = UpstreamFailure::new(message);
        failure.status = status;
        return Err(failure);
    }

    serde_json::from_str(&body)
        .map_err(|e| UpstreamFailure::new(format!("Unexpected response body: {}", e)))
}

/// `key=value|key=value`, with `=` and `|` escaped
fn context_string(context: &crate::domain::Metadata) -> String {
    context
        .iter()
        .map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}={}", escape_context(k), escape_context(&value))
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_context(value: &str) -> String {
    value.replace('=', "\\=").replace('|', "\\|")
}

fn encode_public_id(public_id: &str) -> String {
    public_id
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl CloudinaryApi for HttpCloudinaryClient {
    async fn upload(
        &self,
        request: CloudinaryUploadRequest,
    ) -> Result<CloudinaryResource, UpstreamFailure> {
        let mut params = BTreeMap::new();
        params.insert("public_id", request.public_id.clone());
        params.insert("tags", request.tags.join(","));
        params.insert("context", context_string(&request.context));
        params.insert("transformation", request.transformation.clone().unwrap_or_default());
        let params = self.signed_params(params);

        let mut file = multipart::Part::bytes(request.file.to_vec());
        if let Some(filename) = &request.filename {
            file = file.file_name(filename.clone());
        }
        let file = file
            .mime_str(&request.content_type)
            .map_err(|e| UpstreamFailure::new(format!("Invalid content type: {}", e)))?;

        let mut form = multipart::Form::new().part("file", file);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = self.url(&format!("{}/upload", request.resource_type));
        self.send(self.http.post(url).multipart(form)).await
    }

    async fn destroy(&self, public_id: &str, resource_type: &str) -> Result<String, UpstreamFailure> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("invalidate", "true".to_string());
        let params = self.signed_params(params);

        let url = self.url(&format!("{}/destroy", resource_type));
        let body: DestroyBody = self.send(self.http.post(url).form(&params)).await?;
        Ok(body.result)
    }

    async fn resource(
        &self,
        public_id: &str,
        resource_type: &str,
    ) -> Result<CloudinaryResource, UpstreamFailure> {
        let url = self.url(&format!(
            "resources/{}/upload/{}",
            resource_type,
            encode_public_id(public_id)
        ));
        self.send(self.admin(self.http.get(url))).await
    }

    async fn search(
        &self,
        request: CloudinarySearchRequest,
    ) -> Result<CloudinarySearchResponse, UpstreamFailure> {
        let url = self.url("resources/search");
        self.send(self.admin(self.http.post(url).json(&request))).await
    }
}

impl std::fmt::Debug for HttpCloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCloudinaryClient")
            .field("base_url", &self.base_url)
            .field("cloud_name", &self.cloud_name)
            .finish()
    }
}
