use serde_json::json;
use std::time::Duration;

use super::{create_plugin, Plugin, PluginHooks, PluginOptions};
use crate::domain::{ErrorKind, MediaError};

pub const PLUGIN_NAME: &str = "retry";

/// Exponential backoff for failed provider calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Error kinds worth another attempt
    pub retry_on: Vec<ErrorKind>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            retry_on: vec![ErrorKind::NetworkError, ErrorKind::RateLimited, ErrorKind::ProviderError],
        }
    }
}

impl RetryOptions {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn retry_on(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.retry_on = kinds.into_iter().collect();
        self
    }

    /// `base_delay * backoff_factor^(attempt - 1)`, capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        if secs.is_nan() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Delay before the next attempt, or `None` to give up
    pub fn next_delay(&self, error: &MediaError, attempt: u32) -> Option<Duration> {
        if attempt > self.max_retries || !self.retry_on.contains(&error.kind()) {
            return None;
        }
        Some(self.delay_for(attempt))
    }
}

pub fn retry_plugin(options: RetryOptions) -> Plugin {
    let config = json!({
        "maxRetries": options.max_retries,
        "baseDelayMs": options.base_delay.as_millis() as u64,
        "maxDelayMs": options.max_delay.as_millis() as u64,
        "backoffFactor": options.backoff_factor,
        "retryOn": options.retry_on.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
    });

    create_plugin(
        PLUGIN_NAME,
        PluginOptions::version(env!("CARGO_PKG_VERSION")).with_config(config),
        PluginHooks::new().retry(move |error, attempt| {
            let delay = options.next_delay(error, attempt);
            if let Some(delay) = delay {
                tracing::info!(
                    attempt,
                    max_retries = options.max_retries,
                    kind = %error.kind(),
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling retry"
                );
            }
            delay
        }),
    )
}
