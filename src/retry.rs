//! Bounded retry loops.
//!
//! Every retried operation in the engine goes through [`retry`]: an explicit loop with
//! an attempt counter and a fixed delay between attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::{AssistantError, EngineError};

/// Errors that know whether another attempt might succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for AssistantError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl Retryable for EngineError {
    fn is_retryable(&self) -> bool {
        EngineError::is_retryable(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no delay.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the policy's attempt
/// budget is spent. `op` receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(
                    operation = what,
                    attempt,
                    max_attempts,
                    error = %err,
                    "retrying after failure"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
