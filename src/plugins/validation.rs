//! Rejects uploads by size, MIME type or extension before they reach the
//! provider.

use bon::Builder;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use super::{create_plugin, Plugin, PluginHooks, PluginOptions};
use crate::{
    adapters::outbound::detection::MagicByteDetector,
    domain::{ErrorKind, FileInput, MediaError, MediaResult, UploadOptions},
    ports::FileTypeDetector,
};

pub const PLUGIN_NAME: &str = "validation";

#[derive(Debug, Clone, Default, Builder)]
pub struct ValidationOptions {
    /// Inclusive upper bound in bytes
    pub max_size: Option<u64>,
    /// Inclusive lower bound in bytes
    pub min_size: Option<u64>,
    /// Exact types or `type/*` wildcards; empty allows everything
    #[builder(default)]
    pub allowed_types: Vec<String>,
    /// Extensions with or without the leading dot; empty allows everything
    #[builder(default)]
    pub allowed_extensions: Vec<String>,
}

struct Validator {
    options: ValidationOptions,
    detector: Arc<dyn FileTypeDetector>,
}

impl Validator {
    fn check(&self, file: &FileInput, options: &mut UploadOptions) -> MediaResult<()> {
        let size = file.size();
        if let Some(max) = self.options.max_size {
            if size > max {
                return Err(MediaError::new(
                    ErrorKind::FileTooLarge,
                    PLUGIN_NAME,
                    format!("File size {} exceeds the maximum of {} bytes", size, max),
                )
                .with_detail("size", size)
                .with_detail("maxSize", max));
            }
        }
        if let Some(min) = self.options.min_size {
            if size < min {
                return Err(MediaError::new(
                    ErrorKind::FileTooLarge,
                    PLUGIN_NAME,
                    format!("File size {} is below the minimum of {} bytes", size, min),
                )
                .with_detail("size", size)
                .with_detail("minSize", min));
            }
        }

        let detected = self.detector.detect(file.bytes());
        let mime = detected
            .as_ref()
            .map(|t| t.mime.clone())
            .or_else(|| file.declared_type().map(str::to_string));

        if !self.options.allowed_types.is_empty() {
            let allowed = mime
                .as_deref()
                .is_some_and(|mime| self.options.allowed_types.iter().any(|p| mime_matches(p, mime)));
            if !allowed {
                return Err(MediaError::new(
                    ErrorKind::InvalidFileType,
                    PLUGIN_NAME,
                    format!(
                        "File type {} is not allowed",
                        mime.as_deref().unwrap_or("unknown")
                    ),
                )
                .with_detail("allowedTypes", self.options.allowed_types.clone()));
            }
        }

        if !self.options.allowed_extensions.is_empty() {
            let extension = options
                .filename
                .as_deref()
                .and_then(extension_of)
                .or_else(|| file.name_extension())
                .or_else(|| detected.as_ref().map(|t| t.ext.clone()));
            let allowed = extension.as_deref().is_some_and(|ext| {
                self.options
                    .allowed_extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            });
            if !allowed {
                return Err(MediaError::new(
                    ErrorKind::InvalidFileType,
                    PLUGIN_NAME,
                    format!(
                        "File extension {} is not allowed",
                        extension.as_deref().unwrap_or("(none)")
                    ),
                )
                .with_detail("allowedExtensions", self.options.allowed_extensions.clone()));
            }
        }

        options.metadata.insert(
            "validation".into(),
            json!({
                "detectedType": mime,
                "validatedAt": Utc::now().to_rfc3339(),
            }),
        );
        Ok(())
    }
}

fn mime_matches(pattern: &str, mime: &str) -> bool {
    let pattern = pattern.trim();
    if pattern == "*" || pattern == "*/*" {
        return true;
    }
    match pattern.strip_suffix("/*") {
        Some(top) => mime
            .split_once('/')
            .is_some_and(|(mime_top, _)| mime_top.eq_ignore_ascii_case(top)),
        None => pattern.eq_ignore_ascii_case(mime),
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(name[idx + 1..].to_ascii_lowercase()),
        _ => None,
    }
}

pub fn validation_plugin(options: ValidationOptions) -> Plugin {
    validation_plugin_with_detector(options, Arc::new(MagicByteDetector::new()))
}

pub fn validation_plugin_with_detector(
    options: ValidationOptions,
    detector: Arc<dyn FileTypeDetector>,
) -> Plugin {
    let config = json!({
        "maxSize": options.max_size,
        "minSize": options.min_size,
        "allowedTypes": options.allowed_types,
        "allowedExtensions": options.allowed_extensions,
    });
    let validator = Arc::new(Validator { options, detector });

    create_plugin(
        PLUGIN_NAME,
        PluginOptions::version(env!("CARGO_PKG_VERSION")).with_config(config),
        PluginHooks::new().before_upload(move |file, mut options| {
            let validator = validator.clone();
            async move {
                validator.check(&file, &mut options)?;
                Ok(Some((file, options)))
            }
        }),
    )
}
