//! Synchronous poll-until-complete.
//!
//! Blocks the caller until an asynchronously-started remote operation (e.g.
//! a submitted BigQuery job) reaches a terminal state. Any transport failure
//! during a status refresh aborts immediately; there are no retries. A
//! deadline is always enforced so a hung remote job cannot hang the command.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::error::GcpError;

/// Fixed sleep between status refreshes.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Deadline applied when the caller does not supply one.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Re-fetch status via `fetch_status` every [`POLL_INTERVAL`] until
/// `is_done` reports a terminal state, returning the final status object.
///
/// `timeout` of `None` applies [`DEFAULT_POLL_TIMEOUT`]. Exceeding the
/// deadline yields [`GcpError::Timeout`] naming `operation`.
pub async fn poll_until_done<T, F, Fut, P>(
    operation: &str,
    timeout: Option<Duration>,
    mut fetch_status: F,
    mut is_done: P,
) -> Result<T, GcpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GcpError>>,
    P: FnMut(&T) -> bool,
{
    let timeout = timeout.unwrap_or(DEFAULT_POLL_TIMEOUT);
    let deadline = Instant::now() + timeout;

    loop {
        let status = fetch_status().await?;
        if is_done(&status) {
            return Ok(status);
        }

        if Instant::now() >= deadline {
            tracing::warn!("poll of {} timed out after {:?}", operation, timeout);
            return Err(GcpError::Timeout {
                operation: operation.to_string(),
                elapsed: timeout,
            });
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
