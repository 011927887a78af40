//! GitHub core API rate limit guard.

use super::CollaboratorError;
use octocrab::Octocrab;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Longest we are willing to wait for a rate limit window to reset.
const MAX_WAIT_SECS: u64 = 900;

/// Below this many remaining requests we wait for the window to reset.
const MIN_REMAINING_THRESHOLD: u32 = 5;

/// Rate limit state of the core API.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// Unix timestamp when the window resets.
    pub reset: u64,
    /// Total requests allowed per window.
    pub limit: u32,
}

impl RateLimitInfo {
    /// Returns how long to wait at unix time `now` before issuing more requests.
    ///
    /// The wait is capped at 15 minutes.
    #[must_use]
    pub fn wait_duration(&self, now: u64) -> Option<Duration> {
        if self.remaining >= MIN_REMAINING_THRESHOLD || self.reset <= now {
            return None;
        }
        let wait_secs = self.reset - now;
        if wait_secs > MAX_WAIT_SECS {
            warn!(
                wait_secs,
                max_wait = MAX_WAIT_SECS,
                "Rate limit reset too far in future, capping wait time"
            );
        }
        Some(Duration::from_secs(wait_secs.min(MAX_WAIT_SECS)))
    }
}

/// Waits for the core rate limit window to reset if it is nearly exhausted.
///
/// # Errors
///
/// Returns an error if the rate limit API call fails, or
/// [`CollaboratorError::Cancelled`] if `cancel` fires while waiting.
pub async fn ensure_core_rate_limit(
    octocrab: &Octocrab,
    cancel: &CancellationToken,
) -> Result<(), CollaboratorError> {
    let rate_limit = octocrab.ratelimit().get().await?;
    let core = &rate_limit.resources.core;
    let info = RateLimitInfo {
        remaining: core.remaining as u32,
        reset: core.reset,
        limit: core.limit as u32,
    };

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if let Some(wait) = info.wait_duration(now) {
        info!(
            remaining = info.remaining,
            limit = info.limit,
            wait_secs = wait.as_secs(),
            "Rate limit low, waiting for reset"
        );
        if !wait_for_reset(wait, cancel).await {
            return Err(CollaboratorError::Cancelled {
                service: "github".to_string(),
            });
        }
    }
    Ok(())
}

/// Sleeps for `wait` unless `cancel` fires first.
///
/// Returns `false` if the wait was cut short by cancellation.
pub async fn wait_for_reset(wait: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => {
            warn!(wait_secs = wait.as_secs(), "Cancelled while waiting for rate limit reset");
            false
        }
        () = tokio::time::sleep(wait) => true,
    }
}
