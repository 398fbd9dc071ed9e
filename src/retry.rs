//! Retry with backoff for fallible async operations.
//!
//! The helper has no built-in attempt cap: the `should_retry` callback sees
//! every error together with the 1-based attempt number and decides whether
//! to go again. [`RetryOptions::max_attempts`] is a convenience for callers
//! that just want a cap.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Default base delay between attempts.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayStrategy {
    /// Retry immediately.
    #[default]
    None,
    /// `base` every time.
    Constant,
    /// `base * attempt`.
    Linear,
    /// `base * 2^attempt`.
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown delay strategy '{0}', expected none, constant, linear or exponential")]
pub struct UnknownDelayStrategy(pub String);

impl FromStr for DelayStrategy {
    type Err = UnknownDelayStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(DelayStrategy::None),
            "constant" => Ok(DelayStrategy::Constant),
            "linear" => Ok(DelayStrategy::Linear),
            "exponential" => Ok(DelayStrategy::Exponential),
            _ => Err(UnknownDelayStrategy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    pub base_delay_ms: u64,
    pub delay_strategy: DelayStrategy,
    /// Cap used by [`RetryOptions::retry_up_to_max`]; `None` means unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            delay_strategy: DelayStrategy::None,
            max_attempts: None,
        }
    }
}

impl RetryOptions {
    pub fn new(delay_strategy: DelayStrategy, base_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            delay_strategy,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay to wait after the failed `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms;
        let ms = match self.delay_strategy {
            DelayStrategy::None => 0,
            DelayStrategy::Constant => base,
            DelayStrategy::Linear => base.saturating_mul(u64::from(attempt)),
            DelayStrategy::Exponential => {
                let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                base.saturating_mul(factor)
            }
        };
        Duration::from_millis(ms)
    }

    /// Whether `attempt` is below the configured cap.
    pub fn retry_up_to_max(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Run `operation`, re-invoking it while `should_retry(&error, attempt)`
/// returns true. The error of the last attempt is returned unchanged.
pub async fn with_retry<T, E, F, Fut, P>(
    mut operation: F,
    mut should_retry: P,
    options: &RetryOptions,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E, u32) -> bool,
{
    let mut attempt: u32 = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !should_retry(&error, attempt) {
                    return Err(error);
                }
                let delay = options.delay_for(attempt);
                if !delay.is_zero() {
                    warn!("Retry attempt {} after {}ms", attempt, delay.as_millis());
                    tokio::time::sleep(delay).await;
                }
                attempt = attempt.saturating_add(1);
            }
        }
    }
}
