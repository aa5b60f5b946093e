use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{create_plugin, ErrorContext, Operation, Plugin, PluginHooks, PluginOptions};
use crate::domain::{ErrorKind, MediaError, UploadResult};

pub const PLUGIN_NAME: &str = "analytics";

/// Counters collected since the last reset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub uploads: u64,
    pub bytes_uploaded: u64,
    pub deletes: u64,
    pub upload_errors: u64,
    pub delete_errors: u64,
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    Uploaded {
        id: String,
        provider: String,
        size: u64,
        format: String,
    },
    Deleted {
        id: String,
    },
    Failed {
        operation: Operation,
        kind: ErrorKind,
        provider: String,
    },
}

pub type EventSink = Arc<dyn Fn(&AnalyticsEvent) + Send + Sync>;

/// Shared upload statistics. Register [`UploadAnalytics::plugin`] with an
/// uploader and read the counters back with [`UploadAnalytics::snapshot`].
#[derive(Default)]
pub struct UploadAnalytics {
    state: Mutex<AnalyticsSnapshot>,
    sink: Option<EventSink>,
}

impl UploadAnalytics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Forward every event to `sink` as well
    pub fn with_sink<F>(sink: F) -> Arc<Self>
    where
        F: Fn(&AnalyticsEvent) + Send + Sync + 'static,
    {
        Arc::new(Self {
            state: Mutex::new(AnalyticsSnapshot::default()),
            sink: Some(Arc::new(sink)),
        })
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        self.state().clone()
    }

    pub fn reset(&self) {
        *self.state() = AnalyticsSnapshot::default();
    }

    fn state(&self) -> MutexGuard<'_, AnalyticsSnapshot> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, event: AnalyticsEvent) {
        if let Some(sink) = &self.sink {
            sink(&event);
        }
    }

    fn record_upload(&self, result: &UploadResult) {
        {
            let mut state = self.state();
            state.uploads += 1;
            state.bytes_uploaded += result.size;
        }
        tracing::info!(
            id = %result.id,
            provider = %result.provider,
            size = result.size,
            format = %result.format,
            "Upload completed"
        );
        self.emit(AnalyticsEvent::Uploaded {
            id: result.id.clone(),
            provider: result.provider.clone(),
            size: result.size,
            format: result.format.clone(),
        });
    }

    fn record_delete(&self, id: &str) {
        self.state().deletes += 1;
        tracing::info!(id, "Delete completed");
        self.emit(AnalyticsEvent::Deleted { id: id.to_string() });
    }

    fn record_error(&self, error: &MediaError, context: &ErrorContext) {
        {
            let mut state = self.state();
            match context.operation {
                Operation::Upload => state.upload_errors += 1,
                Operation::Delete => state.delete_errors += 1,
            }
            *state.errors_by_kind.entry(error.kind()).or_default() += 1;
        }
        tracing::warn!(
            operation = context.operation.as_str(),
            target = context.target.as_deref().unwrap_or("-"),
            kind = %error.kind(),
            provider = error.provider(),
            error = %error,
            "Operation failed"
        );
        self.emit(AnalyticsEvent::Failed {
            operation: context.operation,
            kind: error.kind(),
            provider: error.provider().to_string(),
        });
    }

    /// A plugin feeding these counters
    pub fn plugin(self: &Arc<Self>) -> Plugin {
        let on_upload = self.clone();
        let on_delete = self.clone();
        let on_error = self.clone();

        create_plugin(
            PLUGIN_NAME,
            PluginOptions::version(env!("CARGO_PKG_VERSION")),
            PluginHooks::new()
                .after_upload(move |result| {
                    on_upload.record_upload(&result);
                    async { Ok(None) }
                })
                .after_delete(move |id| {
                    on_delete.record_delete(&id);
                    async { Ok(()) }
                })
                .on_error(move |error, context| {
                    on_error.record_error(&error, &context);
                    async { Ok(()) }
                }),
        )
    }
}

impl std::fmt::Debug for UploadAnalytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadAnalytics")
            .field("snapshot", &self.snapshot())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
