//! Bounded retry with exponential backoff around a [`Fetcher`]
//!
//! With `max_attempts = N` the fetcher is called at most `N` times. Between
//! attempts the controller sleeps `b, 2b, 4b, ...` where `b` is the initial
//! backoff, so an always-failing source costs `N` attempts and `N - 1`
//! sleeps before a [`PermanentFailure`] is reported.

use crate::error::{RelcacheError, RelcacheResult};
use crate::fetch::{Fetcher, TransientFailure};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Retry budget for one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
}

impl RetryPolicy {
    /// Validate a policy. `max_attempts = 1` means no retry.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> RelcacheResult<Self> {
        if max_attempts == 0 {
            return Err(RelcacheError::InvalidRetryPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if initial_backoff.is_zero() {
            return Err(RelcacheError::InvalidRetryPolicy(
                "initial backoff must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            initial_backoff,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }
}

/// The retry budget was exhausted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("gave up after {attempts} attempt(s): {last}")]
pub struct PermanentFailure {
    /// Number of attempts made
    pub attempts: u32,
    /// Failure reported by the final attempt
    pub last: TransientFailure,
}

/// Suspension between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Per-call retry bookkeeping, discarded when the call returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RetryState {
    attempt: u32,
    backoff: Duration,
}

impl RetryState {
    fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            backoff: policy.initial_backoff,
        }
    }

    /// Return the delay to wait now and double it for the next failure
    fn next_backoff(&mut self) -> Duration {
        let delay = self.backoff;
        self.backoff = self.backoff.saturating_mul(2);
        delay
    }
}

/// Fetch `source`, retrying transient failures within the policy's budget
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    sleeper: &dyn Sleeper,
    source: &str,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, PermanentFailure> {
    let mut state = RetryState::new(policy);

    loop {
        state.attempt += 1;

        match fetcher.fetch(source).await {
            Ok(bytes) => {
                debug!(
                    "Fetched {} on attempt {}/{}",
                    source, state.attempt, policy.max_attempts
                );
                return Ok(bytes);
            }
            Err(e) if state.attempt >= policy.max_attempts => {
                warn!(
                    "Fetch attempt {}/{} failed: {}. Giving up",
                    state.attempt, policy.max_attempts, e
                );
                return Err(PermanentFailure {
                    attempts: state.attempt,
                    last: e,
                });
            }
            Err(e) => {
                let delay = state.next_backoff();
                warn!(
                    "Fetch attempt {}/{} failed: {}. Retrying in {:?}",
                    state.attempt, policy.max_attempts, e, delay
                );
                sleeper.sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted results, then fails forever
    struct ScriptedFetcher {
        script: Mutex<VecDeque<Result<Vec<u8>, TransientFailure>>>,
        calls: AtomicU32,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<Vec<u8>, TransientFailure>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn always_failing() -> Self {
            Self::new(Vec::new())
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, _source: &str) -> Result<Vec<u8>, TransientFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransientFailure::Status(500)))
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn policy_validation() {
        assert!(RetryPolicy::new(0, ms(10)).is_err());
        assert!(RetryPolicy::new(3, Duration::ZERO).is_err());
        let policy = RetryPolicy::new(1, ms(10)).unwrap();
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.initial_backoff(), ms(10));
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(5, ms(100)).unwrap();
        let mut state = RetryState::new(&policy);
        let delays: Vec<_> = (0..4).map(|_| state.next_backoff()).collect();
        assert_eq!(delays, vec![ms(100), ms(200), ms(400), ms(800)]);
    }

    #[test]
    fn backoff_saturates() {
        let policy = RetryPolicy::new(3, Duration::MAX).unwrap();
        let mut state = RetryState::new(&policy);
        assert_eq!(state.next_backoff(), Duration::MAX);
        assert_eq!(state.next_backoff(), Duration::MAX);
    }

    #[tokio::test]
    async fn always_failing_exhausts_budget() {
        let fetcher = ScriptedFetcher::always_failing();
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(4, ms(50)).unwrap();

        let err = fetch_with_retry(&fetcher, &sleeper, "http://notes", &policy)
            .await
            .unwrap_err();

        assert_eq!(fetcher.calls(), 4);
        assert_eq!(err.attempts, 4);
        assert_eq!(err.last, TransientFailure::Status(500));
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![ms(50), ms(100), ms(200)]
        );
    }

    #[tokio::test]
    async fn single_attempt_never_sleeps() {
        let fetcher = ScriptedFetcher::always_failing();
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(1, ms(50)).unwrap();

        let err = fetch_with_retry(&fetcher, &sleeper, "http://notes", &policy)
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(fetcher.calls(), 1);
        assert!(sleeper.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(TransientFailure::Timeout),
            Err(TransientFailure::Unreachable("refused".to_string())),
            Ok(b"notes".to_vec()),
        ]);
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(5, ms(10)).unwrap();

        let bytes = fetch_with_retry(&fetcher, &sleeper, "http://notes", &policy)
            .await
            .unwrap();

        assert_eq!(bytes, b"notes");
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(*sleeper.sleeps.lock().unwrap(), vec![ms(10), ms(20)]);
    }

    #[tokio::test]
    async fn first_success_needs_no_sleep() {
        let fetcher = ScriptedFetcher::new(vec![Ok(b"notes".to_vec())]);
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(3, ms(10)).unwrap();

        fetch_with_retry(&fetcher, &sleeper, "http://notes", &policy)
            .await
            .unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(sleeper.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(ms(250)).await;
        assert!(start.elapsed() >= ms(250));
    }
}
