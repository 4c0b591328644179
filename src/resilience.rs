//! Latency and reliability wrappers for single remote calls
//!
//! These compose around the fetch closure handed to the cache layer and know
//! nothing about caching themselves.

use futures::future::select_ok;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Backoff between attempts of a retried call
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// The timer won the race against the wrapped call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Calls `op` up to `attempts` times, sleeping `backoff` between failures
///
/// The final failure is returned once the budget is spent. A budget of zero
/// still makes one attempt.
pub async fn retry<T, E, F, Fut>(attempts: u32, backoff: Duration, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut remaining = attempts.max(1);
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if remaining > 1 => {
                remaining -= 1;
                warn!(error = %e, remaining, "call failed, retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Races `fut` against a timer of length `limit`
///
/// When the timer fires first the call is dropped at its current await point
/// and `TimedOut` is returned. Work the remote side already started is not
/// undone; only the result is discarded.
pub async fn with_timeout<T, E, Fut>(limit: Duration, fut: Fut) -> Result<T, E>
where
    E: From<TimedOut>,
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?limit, "call timed out");
            Err(TimedOut(limit).into())
        }
    }
}

/// Starts `copies` identical calls and returns the first success
///
/// The remaining calls are dropped as soon as one succeeds. If every call
/// fails, the error of the last one to finish is returned. At least one call
/// is always made.
pub async fn race_redundant<T, E, F, Fut>(copies: usize, mut make: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let calls: Vec<_> = (0..copies.max(1)).map(|_| Box::pin(make())).collect();
    debug!(copies = calls.len(), "racing redundant calls");
    select_ok(calls).await.map(|(value, _rest)| value)
}
