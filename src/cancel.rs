//! Cancellation helpers shared by every suspension point of a scan
//!
//! Sleeps and network calls race against the caller's [`CancellationToken`]
//! so that a cancelled scan aborts promptly with [`ScanError::Cancelled`]
//! instead of waiting for a timeout.

use crate::ScanError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a future to completion unless the token fires first
///
/// # Returns
///
/// * `Ok(T)` - The future's output
/// * `Err(ScanError::Cancelled)` - The token was cancelled before completion
pub async fn cancellable<F, T>(cancel: &CancellationToken, fut: F) -> Result<T, ScanError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ScanError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Sleeps for `duration` unless the token fires first
pub async fn sleep_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), ScanError> {
    if duration.is_zero() {
        return if cancel.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        };
    }
    cancellable(cancel, tokio::time::sleep(duration)).await
}
