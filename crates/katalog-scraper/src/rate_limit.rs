//! Retry with exponential back-off and per-shop request spacing.
//!
//! [`retry_with_backoff`] retries transient fetch failures (network errors,
//! 429, 5xx, browser hiccups). Extraction failures and 4xx responses are
//! returned at once: the page will not change between attempts.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ScraperError;

/// Upper bound on a single back-off sleep.
pub const MAX_DELAY_MS: u64 = 60_000;

pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(_)
        | ScraperError::RateLimited { .. }
        | ScraperError::Browser { .. }
        | ScraperError::BrowserTimeout { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::NotFound { .. }
        | ScraperError::InvalidUrl { .. }
        | ScraperError::BrowserUnavailable { .. }
        | ScraperError::Extraction(_)
        | ScraperError::Store(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 3_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 3 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 3 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 3 000 ms × 2² ± 25 % jitter     |
///
/// Delay is capped at 60 s. A 429 with a longer `Retry-After` waits that long
/// instead, still within the cap. Non-retriable errors are returned immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                let delay_ms = match &err {
                    ScraperError::RateLimited {
                        retry_after_secs, ..
                    } => jittered.max(retry_after_secs.saturating_mul(1_000).min(MAX_DELAY_MS)),
                    _ => jittered,
                };
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient fetch error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Spaces out requests to the same shop by that shop's minimum interval.
///
/// Shops are independent: waiting on one never delays another.
#[derive(Debug, Default)]
pub struct ShopThrottle {
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl ShopThrottle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `shop_id` may be contacted again, then reserves the next
    /// slot `min_interval` later.
    pub async fn acquire(&self, shop_id: &str, min_interval: Duration) {
        if min_interval.is_zero() {
            return;
        }
        let wait_until = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots.get(shop_id).copied().filter(|t| *t > now).unwrap_or(now);
            slots.insert(shop_id.to_string(), slot + min_interval);
            slot
        };
        tokio::time::sleep_until(wait_until).await;
    }
}
