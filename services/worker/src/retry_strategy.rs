use shared::constants::*;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::errors::TransportError;

/// Race `future` against a timer. `None` means the timer won; the future is
/// dropped, which cancels an in-flight request.
pub async fn race_with_timeout<F, T>(limit: Duration, future: F) -> Option<T>
where
    F: Future<Output = T>,
{
    timeout(limit, future).await.ok()
}

/// Fixed-pause retry policy applied to every on-chain RPC call.
///
/// Each attempt races the call against `call_timeout`. `settle_pause` follows
/// every attempt; `failure_pause` is added after a failed attempt when another
/// attempt remains.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub call_timeout: Duration,
    pub settle_pause: Duration,
    pub failure_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RPC_MAX_ATTEMPTS,
            call_timeout: Duration::from_millis(RPC_CALL_TIMEOUT_MS),
            settle_pause: Duration::from_millis(RPC_SETTLE_PAUSE_MS),
            failure_pause: Duration::from_millis(RPC_FAILURE_PAUSE_MS),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or attempts run out. `None` is "no response".
    pub async fn run<F, Fut, T>(&self, call: &str, mut op: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        for attempt in 1..=self.max_attempts {
            let outcome = race_with_timeout(self.call_timeout, op()).await;
            sleep(self.settle_pause).await;

            let error = match outcome {
                Some(Ok(value)) => return Some(value),
                Some(Err(e)) => e,
                None => TransportError::Timeout(self.call_timeout.as_millis() as u64),
            };

            metrics::counter!("worker_rpc_attempt_failures_total").increment(1);
            tracing::warn!(
                call,
                attempt,
                max_attempts = self.max_attempts,
                code = %error.code(),
                error = %error,
                "RPC attempt failed"
            );

            if self.should_retry(attempt) {
                sleep(self.failure_pause).await;
            }
        }

        tracing::warn!(call, "RPC call gave no response");
        None
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
