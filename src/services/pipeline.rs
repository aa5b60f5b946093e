use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    domain::{FileInput, MediaError, MediaResult, UploadOptions, UploadResult},
    plugins::{ErrorContext, Plugin},
};

/// Fold every before-upload hook over the input, in registration order
pub async fn run_before_upload(
    plugins: &[Arc<Plugin>],
    mut file: FileInput,
    mut options: UploadOptions,
) -> MediaResult<(FileInput, UploadOptions)> {
    for plugin in plugins {
        if let Some(hook) = &plugin.hooks.before_upload {
            if let Some((next_file, next_options)) = hook(file.clone(), options.clone()).await? {
                tracing::trace!(plugin = %plugin.name, "before_upload rewrote input");
                file = next_file;
                options = next_options;
            }
        }
    }
    Ok((file, options))
}

pub async fn run_after_upload(plugins: &[Arc<Plugin>], mut result: UploadResult) -> MediaResult<UploadResult> {
    for plugin in plugins {
        if let Some(hook) = &plugin.hooks.after_upload {
            if let Some(next) = hook(result.clone()).await? {
                result = next;
            }
        }
    }
    Ok(result)
}

pub async fn run_before_delete(plugins: &[Arc<Plugin>], mut id: String) -> MediaResult<String> {
    for plugin in plugins {
        if let Some(hook) = &plugin.hooks.before_delete {
            if let Some(next) = hook(id.clone()).await? {
                id = next;
            }
        }
    }
    Ok(id)
}

pub async fn run_after_delete(plugins: &[Arc<Plugin>], id: &str) -> MediaResult<()> {
    for plugin in plugins {
        if let Some(hook) = &plugin.hooks.after_delete {
            hook(id.to_string()).await?;
        }
    }
    Ok(())
}

/// Notify every error hook. Hook failures are logged and dropped so the
/// caller always sees the original error.
pub async fn run_on_error(plugins: &[Arc<Plugin>], error: &MediaError, context: &ErrorContext) {
    for plugin in plugins {
        if let Some(hook) = &plugin.hooks.on_error {
            if let Err(hook_error) = hook(error.clone(), context.clone()).await {
                tracing::warn!(
                    plugin = %plugin.name,
                    operation = context.operation.as_str(),
                    error = %hook_error,
                    "on_error hook failed"
                );
            }
        }
    }
}

/// First delay offered by a retry hook, in registration order
pub fn retry_delay(plugins: &[Arc<Plugin>], error: &MediaError, attempt: u32) -> Option<Duration> {
    plugins
        .iter()
        .filter_map(|plugin| plugin.hooks.retry.as_ref())
        .find_map(|hook| hook(error, attempt))
}

/// Run `operation` until it succeeds or no retry hook asks for another attempt
pub async fn with_retries<T, F, Fut>(plugins: &[Arc<Plugin>], operation: F) -> MediaResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = MediaResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => match retry_delay(plugins, &error, attempt) {
                Some(delay) => {
                    tracing::debug!(
                        attempt,
                        kind = %error.kind(),
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::plugins::{create_plugin, PluginHooks, PluginOptions};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn plugin(name: &str, hooks: PluginHooks) -> Arc<Plugin> {
        Arc::new(create_plugin(name, PluginOptions::default(), hooks))
    }

    #[tokio::test]
    async fn test_before_upload_folds_in_order() {
        let plugins = vec![
            plugin(
                "first",
                PluginHooks::new().before_upload(|file, options: UploadOptions| async move {
                    Ok(Some((file, options.with_tag("first"))))
                }),
            ),
            plugin("noop", PluginHooks::new().before_upload(|_f, _o| async { Ok(None) })),
            plugin(
                "second",
                PluginHooks::new().before_upload(|file, mut options: UploadOptions| async move {
                    assert!(options.tags.contains("first"));
                    options.folder = Some("rewritten".into());
                    Ok(Some((file, options)))
                }),
            ),
        ];

        let (_, options) = run_before_upload(
            &plugins,
            FileInput::Bytes(bytes::Bytes::from_static(b"abc")),
            UploadOptions::default(),
        )
        .await
        .unwrap();
        assert!(options.tags.contains("first"));
        assert_eq!(options.folder.as_deref(), Some("rewritten"));
    }

    #[tokio::test]
    async fn test_on_error_failures_are_swallowed() {
        let seen = Arc::new(AtomicU32::new(0));
        let counter = seen.clone();
        let plugins = vec![
            plugin(
                "broken",
                PluginHooks::new().on_error(|_e, _c| async {
                    Err(MediaError::new(ErrorKind::ProviderError, "hook", "boom"))
                }),
            ),
            plugin(
                "counter",
                PluginHooks::new().on_error(move |_e, _c| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
            ),
        ];

        let error = MediaError::new(ErrorKind::NetworkError, "mock", "down");
        run_on_error(&plugins, &error, &ErrorContext::delete("x")).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retries_uses_first_offered_delay() {
        let plugins = vec![
            plugin("declines", PluginHooks::new().retry(|_e, _a| None)),
            plugin(
                "retries",
                PluginHooks::new().retry(|_e, attempt| (attempt < 3).then_some(Duration::from_millis(1))),
            ),
        ];

        let calls = AtomicU32::new(0);
        let result: MediaResult<()> = with_retries(&plugins, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(MediaError::new(ErrorKind::NetworkError, "mock", "down"))
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::NetworkError);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_without_retry_hooks_runs_once() {
        let calls = AtomicU32::new(0);
        let result = with_retries(&[], || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, MediaError>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
