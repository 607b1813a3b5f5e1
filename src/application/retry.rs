//! Bounded retry with exponential backoff.
//!
//! The sleep is behind a trait so retrying code is unit-testable without
//! real delays; production wiring uses [`TokioSleeper`].

use async_trait::async_trait;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

/// Injectable sleep.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test sleeper that records requested delays and returns immediately.
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
        }
    }

    /// Delays requested so far.
    pub fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Default for RecordingSleeper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Bounded exponential backoff: `base, 2*base, 4*base, ...` for a fixed
/// number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    attempts: u32,
    base: Duration,
}

impl Backoff {
    pub fn new(attempts: u32, base: Duration) -> Self {
        Self { attempts, base }
    }

    /// Number of attempts this policy allows.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The delay preceding each attempt, doubling per attempt.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.attempts).map(move |i| self.base * 2u32.pow(i))
    }
}

/// Run `operation` up to the policy's attempt count, sleeping the backoff
/// delay before each attempt. Returns the first success or the last error.
pub async fn with_backoff<F, Fut, T, E>(
    sleeper: &dyn Sleeper,
    policy: Backoff,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;
    for delay in policy.delays() {
        sleeper.sleep(delay).await;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => last_error = Some(error),
        }
    }
    // attempts >= 1 is enforced by every caller; a zero-attempt policy is a
    // programming error and there is nothing sensible to return.
    Err(last_error.expect("Backoff must allow at least one attempt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles_from_base() {
        let policy = Backoff::new(3, Duration::from_secs(2));
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn returns_first_success_without_further_attempts() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result: Result<u32, &str> =
            with_backoff(&sleeper, Backoff::new(3, Duration::from_secs(2)), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(7) }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_returns_last_error() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), String> =
            with_backoff(&sleeper, Backoff::new(3, Duration::from_secs(2)), || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(format!("attempt {} failed", attempt)) }
            })
            .await;

        assert_eq!(result, Err("attempt 3 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.recorded(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn recovers_on_a_later_attempt() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result: Result<u32, &str> =
            with_backoff(&sleeper, Backoff::new(3, Duration::from_secs(2)), || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt < 3 {
                        Err("not yet")
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
    }
}
