use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{FileInput, MediaError, MediaResult, UploadOptions, UploadResult};

/// Future returned by every async hook
pub type HookFuture<T> = BoxFuture<'static, MediaResult<T>>;

pub type InitHook = Arc<dyn Fn() -> HookFuture<()> + Send + Sync>;

/// Returns the rewritten input, or `None` to pass it through unchanged
pub type BeforeUploadHook =
    Arc<dyn Fn(FileInput, UploadOptions) -> HookFuture<Option<(FileInput, UploadOptions)>> + Send + Sync>;

/// Returns the rewritten result, or `None` to pass it through unchanged
pub type AfterUploadHook = Arc<dyn Fn(UploadResult) -> HookFuture<Option<UploadResult>> + Send + Sync>;

/// Returns the rewritten id, or `None` to pass it through unchanged
pub type BeforeDeleteHook = Arc<dyn Fn(String) -> HookFuture<Option<String>> + Send + Sync>;

pub type AfterDeleteHook = Arc<dyn Fn(String) -> HookFuture<()> + Send + Sync>;

pub type ErrorHook = Arc<dyn Fn(MediaError, ErrorContext) -> HookFuture<()> + Send + Sync>;

/// Given the failure and the 1-based number of the failed attempt, return how
/// long to wait before trying again, or `None` to give up
pub type RetryHook = Arc<dyn Fn(&MediaError, u32) -> Option<Duration> + Send + Sync>;

/// The operation an error hook is notified about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::Delete => "delete",
        }
    }
}

/// Where a failure happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub operation: Operation,
    /// Filename for uploads, id for deletes
    pub target: Option<String>,
}

impl ErrorContext {
    pub fn upload(target: Option<String>) -> Self {
        Self {
            operation: Operation::Upload,
            target,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            operation: Operation::Delete,
            target: Some(id.into()),
        }
    }
}

/// The hooks a plugin registers; every hook is optional
#[derive(Clone, Default)]
pub struct PluginHooks {
    pub init: Option<InitHook>,
    pub before_upload: Option<BeforeUploadHook>,
    pub after_upload: Option<AfterUploadHook>,
    pub before_delete: Option<BeforeDeleteHook>,
    pub after_delete: Option<AfterDeleteHook>,
    pub on_error: Option<ErrorHook>,
    pub retry: Option<RetryHook>,
}

impl PluginHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs once when the plugin is registered
    pub fn on_init<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MediaResult<()>> + Send + 'static,
    {
        self.init = Some(Arc::new(move || -> HookFuture<()> { hook().boxed() }));
        self
    }

    pub fn before_upload<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(FileInput, UploadOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MediaResult<Option<(FileInput, UploadOptions)>>> + Send + 'static,
    {
        self.before_upload = Some(Arc::new(
            move |file: FileInput, options: UploadOptions| -> HookFuture<Option<(FileInput, UploadOptions)>> {
                hook(file, options).boxed()
            },
        ));
        self
    }

    pub fn after_upload<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(UploadResult) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MediaResult<Option<UploadResult>>> + Send + 'static,
    {
        self.after_upload = Some(Arc::new(
            move |result: UploadResult| -> HookFuture<Option<UploadResult>> { hook(result).boxed() },
        ));
        self
    }

    pub fn before_delete<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MediaResult<Option<String>>> + Send + 'static,
    {
        self.before_delete = Some(Arc::new(move |id: String| -> HookFuture<Option<String>> {
            hook(id).boxed()
        }));
        self
    }

    pub fn after_delete<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MediaResult<()>> + Send + 'static,
    {
        self.after_delete = Some(Arc::new(move |id: String| -> HookFuture<()> { hook(id).boxed() }));
        self
    }

    pub fn on_error<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(MediaError, ErrorContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MediaResult<()>> + Send + 'static,
    {
        self.on_error = Some(Arc::new(
            move |error: MediaError, context: ErrorContext| -> HookFuture<()> {
                hook(error, context).boxed()
            },
        ));
        self
    }

    pub fn retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MediaError, u32) -> Option<Duration> + Send + Sync + 'static,
    {
        self.retry = Some(Arc::new(hook));
        self
    }

    /// Names of the hooks that are set
    pub fn registered(&self) -> Vec<&'static str> {
        [
            ("init", self.init.is_some()),
            ("before_upload", self.before_upload.is_some()),
            ("after_upload", self.after_upload.is_some()),
            ("before_delete", self.before_delete.is_some()),
            ("after_delete", self.after_delete.is_some()),
            ("on_error", self.on_error.is_some()),
            ("retry", self.retry.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

impl std::fmt::Debug for PluginHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.registered()).finish()
    }
}

/// Version and options bag of a plugin
#[derive(Debug, Clone, Default)]
pub struct PluginOptions {
    pub version: Option<String>,
    pub config: Value,
}

impl PluginOptions {
    pub fn version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            config: Value::Null,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

/// A named set of hooks run by the uploader around provider calls
#[derive(Clone)]
pub struct Plugin {
    pub name: String,
    pub version: Option<String>,
    /// Plugin options; may hold secrets and is never logged
    pub config: Value,
    pub hooks: PluginHooks,
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("hooks", &self.hooks)
            .finish()
    }
}

pub fn create_plugin(name: impl Into<String>, options: PluginOptions, hooks: PluginHooks) -> Plugin {
    Plugin {
        name: name.into(),
        version: options.version,
        config: options.config,
        hooks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_plugin() {
        let plugin = create_plugin(
            "watermark",
            PluginOptions::version("1.2.0").with_config(json!({ "apiKey": "hidden-value" })),
            PluginHooks::new()
                .before_upload(|_file, _options| async { Ok(None) })
                .retry(|_error, _attempt| None),
        );

        assert_eq!(plugin.name, "watermark");
        assert_eq!(plugin.version.as_deref(), Some("1.2.0"));
        assert_eq!(plugin.hooks.registered(), vec!["before_upload", "retry"]);

        let printed = format!("{:?}", plugin);
        assert!(printed.contains("watermark"));
        assert!(!printed.contains("hidden-value"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::delete("a/b");
        assert_eq!(context.operation.as_str(), "delete");
        assert_eq!(context.target.as_deref(), Some("a/b"));
    }
}
