use futures::future::join_all;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::domain::{
    progress, BatchProgress, BatchUploadOptions, ErrorKind, FileInput, MediaError, MediaResult,
    ProgressCallback, UploadOptions, UploadResult,
};

/// Derive one `UploadOptions` per file from the batch template.
///
/// The template's own progress callback is dropped; each file gets a callback
/// feeding the batch progress mode instead. A file handle's name is used as
/// the filename when the template has none.
pub fn per_file_options(files: &[FileInput], options: &BatchUploadOptions) -> Vec<UploadOptions> {
    let total = files.len();
    let overall = match &options.progress {
        BatchProgress::Overall(callback) => Some(OverallProgress::new(callback.clone(), total)),
        _ => None,
    };

    files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let mut derived = options.base.clone();
            derived.on_progress = match &options.progress {
                BatchProgress::None => None,
                BatchProgress::PerFile(callback) => {
                    let callback = callback.clone();
                    Some(Arc::new(move |percent| callback(index, percent)) as ProgressCallback)
                }
                BatchProgress::Overall(_) => overall.as_ref().map(|o| o.for_file(index)),
            };
            if derived.filename.is_none() {
                derived.filename = file.name().map(str::to_string);
            }
            derived
        })
        .collect()
}

/// Blends per-file percentages into one mean percentage
#[derive(Clone)]
struct OverallProgress {
    callback: ProgressCallback,
    slots: Arc<Mutex<Vec<f64>>>,
}

impl OverallProgress {
    fn new(callback: ProgressCallback, total: usize) -> Self {
        let callback = progress::monotonic(Some(callback)).unwrap_or_else(|| Arc::new(|_| {}));
        Self {
            callback,
            slots: Arc::new(Mutex::new(vec![0.0; total])),
        }
    }

    fn for_file(&self, index: usize) -> ProgressCallback {
        let overall = self.clone();
        Arc::new(move |percent| overall.update(index, percent))
    }

    fn update(&self, index: usize, percent: f64) {
        let mean = {
            let mut slots = match self.slots.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(slot) = slots.get_mut(index) {
                *slot = percent;
            }
            if slots.is_empty() {
                return;
            }
            slots.iter().sum::<f64>() / slots.len() as f64
        };
        (self.callback)(mean);
    }
}

/// Upload `files` in windows of `options.concurrency`.
///
/// Each window settles completely before the next one starts. Results keep
/// input order. When a window contains failures, the first one (by input
/// order) is returned and later windows never start.
pub async fn upload_in_windows<F, Fut>(
    files: Vec<FileInput>,
    options: BatchUploadOptions,
    upload: F,
) -> MediaResult<Vec<UploadResult>>
where
    F: Fn(FileInput, UploadOptions) -> Fut,
    Fut: Future<Output = MediaResult<UploadResult>>,
{
    let concurrency = options.concurrency.max(1);
    let derived = per_file_options(&files, &options);
    let mut pending = files.into_iter().zip(derived);
    let mut results = Vec::new();

    loop {
        let window: Vec<_> = pending.by_ref().take(concurrency).collect();
        if window.is_empty() {
            break;
        }

        let outcomes = join_all(window.into_iter().map(|(file, opts)| upload(file, opts))).await;
        for outcome in outcomes {
            results.push(outcome?);
        }
    }

    Ok(results)
}

/// Delete every id in windows of `concurrency`.
///
/// All ids are attempted. Any failure yields a single `DELETE_FAILED` error
/// whose details list the failed ids and the individual errors.
pub async fn delete_in_windows<F, Fut>(
    provider: &str,
    ids: Vec<String>,
    concurrency: usize,
    delete: F,
) -> MediaResult<()>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = MediaResult<()>>,
{
    let concurrency = concurrency.max(1);
    let total = ids.len();
    let mut failures: Vec<(String, MediaError)> = Vec::new();

    for window in ids.chunks(concurrency) {
        let outcomes = join_all(window.iter().cloned().map(|id| delete(id))).await;
        for (id, outcome) in window.iter().zip(outcomes) {
            if let Err(error) = outcome {
                failures.push((id.clone(), error));
            }
        }
    }

    if failures.is_empty() {
        return Ok(());
    }

    let failed = failures.len();
    let errors: Vec<Value> = failures
        .iter()
        .map(|(id, error)| {
            json!({
                "id": id,
                "kind": error.kind(),
                "message": error.message(),
            })
        })
        .collect();
    let failed_ids: Vec<&str> = failures.iter().map(|(id, _)| id.as_str()).collect();

    let mut details = Map::new();
    details.insert("failedIds".into(), json!(failed_ids));
    details.insert("failed".into(), json!(failed));
    details.insert("succeeded".into(), json!(total - failed));
    details.insert("total".into(), json!(total));
    details.insert("errors".into(), Value::Array(errors));

    let mut error = MediaError::new(
        ErrorKind::DeleteFailed,
        provider,
        format!("Failed to delete {} of {} files", failed, total),
    )
    .with_details(details);
    if let Some((_, first)) = failures.into_iter().next() {
        error = error.with_cause(first);
    }
    Err(error)
}
