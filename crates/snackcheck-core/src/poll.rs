//! Eventual-Consistency Poller
//!
//! Re-invokes a probe at a constant interval until a predicate holds or the
//! timeout elapses. Uses `tokio::time`, so paused-clock tests are exact.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::trace;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
        }
    }
}

impl PollConfig {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The predicate never held within the timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("condition not met after {attempts} attempts in {elapsed_ms} ms (timeout {timeout_ms} ms)")]
pub struct PollTimeout {
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub timeout_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum PollError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Timeout(#[from] PollTimeout),

    /// The probe itself failed; polling stops immediately.
    #[error("probe failed: {0}")]
    Probe(#[source] E),
}

/// Poll an infallible probe.
pub async fn wait_for_it<T, F, Fut, P>(
    mut probe: F,
    predicate: P,
    config: PollConfig,
) -> Result<T, PollTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let result = try_wait_for_it(
        || {
            let fut = probe();
            async move { Ok::<T, Infallible>(fut.await) }
        },
        predicate,
        config,
    )
    .await;

    match result {
        Ok(value) => Ok(value),
        Err(PollError::Timeout(timeout)) => Err(timeout),
        Err(PollError::Probe(never)) => match never {},
    }
}

/// Poll a fallible probe; a probe error ends polling at once.
pub async fn try_wait_for_it<T, E, F, Fut, P>(
    mut probe: F,
    predicate: P,
    config: PollConfig,
) -> Result<T, PollError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let value = probe().await.map_err(PollError::Probe)?;
        if predicate(&value) {
            return Ok(value);
        }

        let elapsed = started.elapsed();
        if elapsed >= config.timeout() {
            return Err(PollTimeout {
                attempts,
                elapsed_ms: elapsed.as_millis() as u64,
                timeout_ms: config.timeout_ms,
            }
            .into());
        }

        trace!(attempt = attempts, elapsed_ms = elapsed.as_millis() as u64, "Condition not met, retrying");
        tokio::time::sleep(config.interval()).await;
    }
}
