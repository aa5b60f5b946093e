use async_trait::async_trait;
use bytes::Bytes;
use media_uploader::{
    adapters::outbound::storage::MEMORY_FEATURES,
    plugins::{
        retry_plugin, validation_plugin, ErrorContext, Operation, RetryOptions, UploadAnalytics,
        ValidationOptions,
    },
    prelude::*,
    BatchProgress, MemoryProvider, ProviderFeatures,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Memory-backed provider that fails the first `failures` uploads and
/// deletes of ids starting with `bad`
struct ScriptedProvider {
    inner: MemoryProvider,
    failures: AtomicU32,
    failure_kind: ErrorKind,
    uploads: AtomicU32,
}

impl ScriptedProvider {
    fn new(failures: u32, failure_kind: ErrorKind) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryProvider::new(),
            failures: AtomicU32::new(failures),
            failure_kind,
            uploads: AtomicU32::new(0),
        })
    }

    fn uploads(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn features(&self) -> &'static ProviderFeatures {
        &MEMORY_FEATURES
    }

    async fn upload(&self, file: FileInput, options: UploadOptions) -> MediaResult<UploadResult> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(MediaError::new(self.failure_kind, "scripted", "scripted failure"));
        }
        self.inner.upload(file, options).await
    }

    async fn delete(&self, id: &str) -> MediaResult<()> {
        if id.starts_with("bad") {
            return Err(MediaError::new(ErrorKind::DeleteFailed, "scripted", format!("cannot delete {}", id)));
        }
        self.inner.delete(id).await
    }

    async fn get(&self, id: &str) -> MediaResult<UploadResult> {
        self.inner.get(id).await
    }

    fn get_url(&self, id: &str, transformation: Option<&TransformationOptions>) -> MediaResult<String> {
        self.inner.get_url(id, transformation)
    }
}

fn bytes(data: &'static [u8]) -> FileInput {
    FileInput::Bytes(Bytes::from_static(data))
}

fn named(name: &str) -> UploadOptions {
    UploadOptions::builder().filename(name).unique_filename(false).build()
}

#[tokio::test]
async fn test_end_to_end_memory_upload() {
    let uploader = create_uploader(ProviderConfig::Memory).await.unwrap();
    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = progress.clone();

    let options = UploadOptions::builder()
        .folder("t")
        .filename("x")
        .unique_filename(false)
        .build()
        .with_progress(move |p| seen.lock().unwrap().push(p));

    let result = uploader.upload(bytes(b"0123456789"), options).await.unwrap();
    assert_eq!(result.id, "t/x");
    assert_eq!(result.size, 10);
    assert_eq!(result.provider, "memory");

    let progress = progress.lock().unwrap();
    assert_eq!(progress.last().copied(), Some(100.0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_hooks_rewrite_input_and_result() {
    let uploader = create_uploader(ProviderConfig::Memory).await.unwrap();
    uploader
        .use_plugin(create_plugin(
            "rewrite",
            PluginOptions::default(),
            PluginHooks::new()
                .before_upload(|file, mut options: UploadOptions| async move {
                    options.folder = Some("rewritten".into());
                    Ok(Some((file, options.with_metadata("stage", "before"))))
                })
                .after_upload(|mut result: UploadResult| async move {
                    result.metadata.insert("stage".into(), "after".into());
                    Ok(Some(result))
                }),
        ))
        .await
        .unwrap();

    let result = uploader.upload(bytes(b"hello"), named("a.txt")).await.unwrap();
    assert_eq!(result.id, "rewritten/a.txt");
    assert_eq!(result.metadata["stage"], "after");

    let stored = uploader.get("rewritten/a.txt").await.unwrap();
    assert_eq!(stored.metadata["stage"], "before");
}

#[tokio::test]
async fn test_retry_plugin_recovers_from_transient_failures() {
    let provider = ScriptedProvider::new(2, ErrorKind::NetworkError);
    let uploader = UploaderBuilder::new()
        .with_provider(provider.clone())
        .with_plugin(retry_plugin(
            RetryOptions::default().with_base_delay(Duration::from_millis(1)),
        ))
        .build()
        .await
        .unwrap();

    let result = uploader.upload(bytes(b"data"), named("r.bin")).await.unwrap();
    assert_eq!(result.id, "r.bin");
    assert_eq!(provider.uploads(), 3);
}

#[tokio::test]
async fn test_non_retryable_errors_reach_error_hooks_once() {
    let provider = ScriptedProvider::new(1, ErrorKind::InvalidCredentials);
    let contexts: Arc<Mutex<Vec<(ErrorKind, ErrorContext)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = contexts.clone();

    let uploader = UploaderBuilder::new()
        .with_provider(provider.clone())
        .with_plugin(retry_plugin(RetryOptions::default()))
        .with_plugin(create_plugin(
            "observer",
            PluginOptions::default(),
            PluginHooks::new().on_error(move |error, context| {
                seen.lock().unwrap().push((error.kind(), context));
                async { Ok(()) }
            }),
        ))
        .build()
        .await
        .unwrap();

    let err = uploader.upload(bytes(b"data"), named("c.bin")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredentials);
    assert_eq!(provider.uploads(), 1);

    let contexts = contexts.lock().unwrap();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].0, ErrorKind::InvalidCredentials);
    assert_eq!(contexts[0].1.operation, Operation::Upload);
    assert_eq!(contexts[0].1.target.as_deref(), Some("c.bin"));
}

#[tokio::test]
async fn test_validation_rejects_before_the_provider_is_called() {
    let provider = ScriptedProvider::new(0, ErrorKind::NetworkError);
    let analytics = UploadAnalytics::new();
    let uploader = UploaderBuilder::new()
        .with_provider(provider.clone())
        .with_plugin(validation_plugin(ValidationOptions::builder().max_size(4).build()))
        .with_plugin(analytics.plugin())
        .build()
        .await
        .unwrap();

    let err = uploader.upload(bytes(b"too large"), named("big.bin")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileTooLarge);
    assert_eq!(provider.uploads(), 0);

    uploader.upload(bytes(b"ok"), named("small.bin")).await.unwrap();
    let snapshot = analytics.snapshot();
    assert_eq!(snapshot.uploads, 1);
    assert_eq!(snapshot.bytes_uploaded, 2);
    assert_eq!(snapshot.upload_errors, 1);
}

#[tokio::test]
async fn test_delete_hooks() {
    let deleted = Arc::new(Mutex::new(Vec::new()));
    let seen = deleted.clone();
    let uploader = UploaderBuilder::new()
        .with_plugin(create_plugin(
            "scoped",
            PluginOptions::default(),
            PluginHooks::new()
                .before_delete(|id: String| async move { Ok(Some(format!("tenant/{}", id))) })
                .after_delete(move |id| {
                    seen.lock().unwrap().push(id);
                    async { Ok(()) }
                }),
        ))
        .build()
        .await
        .unwrap();

    let options = UploadOptions::builder()
        .folder("tenant")
        .filename("doc.txt")
        .unique_filename(false)
        .build();
    uploader.upload(bytes(b"doc"), options).await.unwrap();

    uploader.delete("doc.txt").await.unwrap();
    assert_eq!(*deleted.lock().unwrap(), vec!["tenant/doc.txt".to_string()]);
    assert_eq!(
        uploader.get("tenant/doc.txt").await.unwrap_err().kind(),
        ErrorKind::FileNotFound
    );
}

#[tokio::test]
async fn test_batch_upload_runs_every_file_through_plugins() {
    let analytics = UploadAnalytics::new();
    let uploader = UploaderBuilder::new()
        .with_plugin(analytics.plugin())
        .build()
        .await
        .unwrap();

    let overall = Arc::new(Mutex::new(Vec::new()));
    let seen = overall.clone();
    let files: Vec<FileInput> = (0..5)
        .map(|i| {
            FileInput::File(FileHandle::new(Bytes::from(vec![i as u8; 3])).with_name(format!("f{}.bin", i)))
        })
        .collect();
    let options = BatchUploadOptions::new(UploadOptions::builder().folder("batch").unique_filename(false).build())
        .with_concurrency(2)
        .with_progress(BatchProgress::Overall(Arc::new(move |p| seen.lock().unwrap().push(p))));

    let results = uploader.upload_multiple(files, options).await.unwrap();
    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["batch/f0.bin", "batch/f1.bin", "batch/f2.bin", "batch/f3.bin", "batch/f4.bin"]);
    assert_eq!(analytics.snapshot().uploads, 5);

    let overall = overall.lock().unwrap();
    assert_eq!(overall.last().copied(), Some(100.0));
    assert!(overall.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_batch_delete_aggregates_failures() {
    let provider = ScriptedProvider::new(0, ErrorKind::NetworkError);
    let uploader = Uploader::new(provider);
    uploader.upload(bytes(b"1"), named("good-1")).await.unwrap();

    let err = uploader
        .delete_multiple(
            vec!["good-1".into(), "bad-1".into(), "good-2".into(), "bad-2".into()],
            Some(3),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DeleteFailed);
    assert_eq!(
        err.detail("failedIds"),
        Some(&serde_json::json!(["bad-1", "bad-2"]))
    );
    assert_eq!(
        uploader.get("good-1").await.unwrap_err().kind(),
        ErrorKind::FileNotFound
    );
}

#[tokio::test]
async fn test_search_is_unsupported_without_a_search_api() {
    let uploader = create_uploader(ProviderConfig::Memory).await.unwrap();
    let err = uploader.search(SearchOptions::expression("x")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderError);
    assert!(!uploader.supports("transformations.resize"));
}

fn logging_plugin(name: &'static str, log: Arc<Mutex<Vec<String>>>, reject: bool) -> Plugin {
    let before_log = log.clone();
    create_plugin(
        name,
        PluginOptions::default(),
        PluginHooks::new()
            .before_upload(move |file, options: UploadOptions| {
                before_log.lock().unwrap().push(format!("before-{}", name));
                async move {
                    if reject {
                        return Err(MediaError::new(ErrorKind::InvalidFileType, name, "rejected"));
                    }
                    Ok(Some((file, options)))
                }
            })
            .on_error(move |_error, _context| {
                log.lock().unwrap().push(format!("err-{}", name));
                async { Ok(()) }
            }),
    )
}

#[tokio::test]
async fn test_failing_before_hook_stops_the_chain_and_notifies_every_plugin() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let uploader = UploaderBuilder::new()
        .with_plugin(logging_plugin("A", log.clone(), false))
        .with_plugin(logging_plugin("B", log.clone(), true))
        .with_plugin(logging_plugin("C", log.clone(), false))
        .build()
        .await
        .unwrap();

    let err = uploader.upload(bytes(b"data"), named("x")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFileType);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before-A", "before-B", "err-A", "err-B", "err-C"]
    );
    assert_eq!(uploader.get("x").await.unwrap_err().kind(), ErrorKind::FileNotFound);
}
