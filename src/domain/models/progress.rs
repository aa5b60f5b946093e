use std::sync::{Arc, Mutex};

/// Upload progress callback, invoked with a percentage in `[0, 100]`
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Wraps a caller callback so that it only ever sees clamped,
/// non-decreasing percentages
#[derive(Clone)]
pub struct ProgressTracker {
    callback: Option<ProgressCallback>,
    last: Arc<Mutex<Option<f64>>>,
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.callback.is_some()
    }

    /// Report a percentage. Values below the last reported one are dropped.
    pub fn report(&self, percent: f64) {
        let Some(callback) = &self.callback else {
            return;
        };

        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };

        {
            let mut last = match self.last.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if last.is_some_and(|prev| percent < prev) {
                return;
            }
            *last = Some(percent);
        }

        callback(percent);
    }

    /// Report `done` out of `total` bytes
    pub fn report_bytes(&self, done: u64, total: u64) {
        if total == 0 {
            self.report(100.0);
        } else {
            self.report(done as f64 * 100.0 / total as f64);
        }
    }

    pub fn start(&self) {
        self.report(0.0);
    }

    pub fn complete(&self) {
        self.report(100.0);
    }

    /// Turn the tracker back into a plain callback
    pub fn into_callback(self) -> Option<ProgressCallback> {
        if self.callback.is_none() {
            return None;
        }
        let tracker = self;
        Some(Arc::new(move |percent| tracker.report(percent)))
    }
}

/// Guard an optional callback so it stays monotonic across every call made
/// through the returned callback (including retried attempts)
pub fn monotonic(callback: Option<ProgressCallback>) -> Option<ProgressCallback> {
    ProgressTracker::new(callback).into_callback()
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}
