//! Timeouts and bounded retries for chain calls

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::cancel::CancelHandle;
use super::state::FailureCause;
use crate::client::ChainError;

/// Bounded exponential backoff for `ChainUnavailable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Total attempts, first one included
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(32);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    Read,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallFailure {
    Chain { error: ChainError, attempts: u32 },
    Cancelled,
}

impl CallFailure {
    pub(crate) fn into_cause(self) -> FailureCause {
        match self {
            CallFailure::Chain { error, attempts } => FailureCause::from_chain(error, attempts),
            CallFailure::Cancelled => FailureCause::Cancelled,
        }
    }
}

/// Run `fut` under `timeout`
///
/// An elapsed read is `ChainUnavailable`; an elapsed submission is
/// `TxTimeout` since the transaction may still be included.
pub(crate) async fn with_timeout<T, F>(
    kind: CallKind,
    timeout: Duration,
    fut: F,
) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, ChainError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(match kind {
            CallKind::Read => {
                ChainError::ChainUnavailable(format!("no response within {:?}", timeout))
            }
            CallKind::Submit => ChainError::TxTimeout { waited: timeout },
        }),
    }
}

/// Call `op` until it succeeds, fails permanently or attempts run out
///
/// Submissions check `cancel` before each attempt. Backoff sleeps end early on
/// cancellation.
pub(crate) async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    kind: CallKind,
    timeout: Duration,
    label: &str,
    cancel: &CancelHandle,
    mut op: F,
) -> Result<T, CallFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        if kind == CallKind::Submit && cancel.is_cancelled() {
            return Err(CallFailure::Cancelled);
        }

        match with_timeout(kind, timeout, op()).await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    call = label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    ?delay,
                    %error,
                    "Chain call failed, retrying"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(CallFailure::Cancelled),
                }
            }
            Err(error) => {
                return Err(CallFailure::Chain {
                    error,
                    attempts: attempt,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> ChainError {
        ChainError::ChainUnavailable("connection refused".to_string())
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(4), Duration::from_millis(4_000));
        assert_eq!(policy.backoff(5), Duration::from_millis(5_000));
        assert_eq!(policy.backoff(60), Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = &AtomicU32::new(0);
        let result = retry(
            &RetryPolicy::default(),
            CallKind::Read,
            Duration::from_secs(1),
            "chain_id",
            &CancelHandle::new(),
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable())
                } else {
                    Ok(7u64)
                }
            },
        )
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(
            &RetryPolicy::default(),
            CallKind::Read,
            Duration::from_secs(1),
            "chain_id",
            &CancelHandle::new(),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            },
        )
        .await;

        assert_eq!(
            result,
            Err(CallFailure::Chain {
                error: unavailable(),
                attempts: 3
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(
            &RetryPolicy::default(),
            CallKind::Submit,
            Duration::from_secs(1),
            "approve",
            &CancelHandle::new(),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ChainError::TxReverted {
                    reason: "nope".to_string(),
                })
            },
        )
        .await;

        assert!(matches!(result, Err(CallFailure::Chain { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_submission_is_timeout() {
        let result: Result<(), _> = with_timeout(CallKind::Submit, Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert_eq!(
            result,
            Err(ChainError::TxTimeout {
                waited: Duration::from_secs(5)
            })
        );

        let result: Result<(), _> = with_timeout(CallKind::Read, Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ChainError::ChainUnavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_submission_never_attempted() {
        let cancel = CancelHandle::new();
        cancel.cancel();
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(
            &RetryPolicy::default(),
            CallKind::Submit,
            Duration::from_secs(1),
            "wrapCopyright",
            &cancel,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert_eq!(result, Err(CallFailure::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
