//! Bounded exponential backoff for read requests.
//!
//! Reads are idempotent, so a transient failure (connection error, timeout,
//! 5xx) is retried up to [`RetryPolicy::max_retries`] times. Mutations never
//! go through here: resubmitting one could apply it twice.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub base_delay:  Duration,
  pub max_delay:   Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      base_delay:  Duration::from_secs(1),
      max_delay:   Duration::from_secs(30),
    }
  }
}

impl RetryPolicy {
  /// Delay before retry number `attempt` (0-based): `base · 2^attempt`,
  /// capped at `max_delay`.
  pub fn delay(&self, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    self
      .base_delay
      .checked_mul(factor)
      .map_or(self.max_delay, |d| d.min(self.max_delay))
  }
}

/// Whether a failed request is worth repeating.
pub fn is_transient(err: &reqwest::Error) -> bool {
  err.is_connect()
    || err.is_timeout()
    || err.status().is_some_and(|s| s.is_server_error())
}

/// Send the request produced by `build`, retrying transient failures with
/// `policy`'s backoff. The final response is returned whatever its status,
/// so callers can read the error body.
pub async fn send_with_retry<F>(
  policy: &RetryPolicy,
  what: &str,
  mut build: F,
) -> reqwest::Result<reqwest::Response>
where
  F: FnMut() -> reqwest::RequestBuilder,
{
  let mut attempt = 0;
  loop {
    let outcome = build().send().await;
    let reason = match &outcome {
      Ok(resp) if resp.status().is_server_error() => Some(resp.status().to_string()),
      Err(e) if is_transient(e) => Some(e.to_string()),
      _ => None,
    };

    match reason {
      Some(reason) if attempt < policy.max_retries => {
        let delay = policy.delay(attempt);
        tracing::warn!(
          request = what,
          attempt = attempt + 1,
          delay_ms = delay.as_millis() as u64,
          %reason,
          "transient failure; retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      _ => return outcome,
    }
  }
}
