//! Bounded retry of GitLab calls.
//!
//! A [`RetryPolicy`] is an attempt budget plus a fixed interval between
//! attempts. It is built from either an attempt count or a total timeout; when
//! both are given the interval is derived as `timeout / attempts`.
//!
//! Two loops are offered:
//!
//! - [`RetryPolicy::run`] repeats an operation while it fails with a retryable
//!   error (see [`Error::is_retryable`]) and propagates anything else on first
//!   occurrence.
//! - [`RetryPolicy::poll`] repeats a probe until it reports a value, used to
//!   wait for asynchronous server-side work such as fork population.

use std::thread;
use std::time::Duration;

use log::warn;

use crate::error::{Error, Result};

/// Attempt budget and interval for a retry or polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    /// Build a policy from an attempt count and/or a total timeout.
    ///
    /// - attempts only: `attempts` tries, `interval` apart
    /// - timeout only: as many tries as fit into `timeout` at `interval`
    /// - both: `attempts` tries with the interval derived as `timeout / attempts`
    /// - neither, or a budget of zero attempts: [`Error::InvalidRetryPolicy`]
    pub fn new(
        attempts: Option<u32>,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let (max_attempts, interval) = match (attempts, timeout) {
            (None, None) => {
                return Err(Error::InvalidRetryPolicy {
                    message: "specify either an attempt count or a timeout".to_string(),
                })
            }
            (Some(n), None) => (n, interval),
            (Some(n), Some(total)) => {
                if n == 0 {
                    (0, interval)
                } else {
                    (n, total / n)
                }
            }
            (None, Some(total)) => {
                if interval.is_zero() {
                    return Err(Error::InvalidRetryPolicy {
                        message: "a timeout needs a non-zero interval".to_string(),
                    });
                }
                let n = total.as_millis().div_ceil(interval.as_millis().max(1));
                (u32::try_from(n).unwrap_or(u32::MAX), interval)
            }
        };

        if max_attempts == 0 {
            return Err(Error::InvalidRetryPolicy {
                message: "the retry budget allows no attempt at all".to_string(),
            });
        }

        Ok(Self {
            max_attempts,
            interval,
        })
    }

    /// Policy from known-good constants; a zero count is raised to one.
    pub const fn fixed(max_attempts: u32, interval: Duration) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self {
            max_attempts,
            interval,
        }
    }

    /// Policy with a fixed number of attempts.
    pub fn attempts(attempts: u32, interval: Duration) -> Result<Self> {
        Self::new(Some(attempts), interval, None)
    }

    /// Policy bounded by a total timeout.
    pub fn timeout(timeout: Duration, interval: Duration) -> Result<Self> {
        Self::new(None, interval, Some(timeout))
    }

    /// Maximum number of attempts, always at least one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause between two consecutive attempts.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// `op` receives the 1-based attempt number. Exhaustion yields
    /// [`Error::RetriesExhausted`] carrying the last transient error.
    pub fn run<T, F>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    if attempt >= self.max_attempts {
                        return Err(Error::RetriesExhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    warn!(
                        "{} failed (attempt {}/{}), will retry: {}",
                        operation, attempt, self.max_attempts, e
                    );
                    self.pause();
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Probe repeatedly until `probe` returns `Some`.
    ///
    /// Errors from the probe propagate immediately. Running out of attempts
    /// yields [`Error::Timeout`].
    pub fn poll<T, F>(&self, operation: &str, mut probe: F) -> Result<T>
    where
        F: FnMut(u32) -> Result<Option<T>>,
    {
        for attempt in 1..=self.max_attempts {
            if let Some(value) = probe(attempt)? {
                return Ok(value);
            }
            if attempt < self.max_attempts {
                self.pause();
            }
        }
        Err(Error::Timeout {
            operation: operation.to_string(),
            attempts: self.max_attempts,
        })
    }

    fn pause(&self) {
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
    }
}
