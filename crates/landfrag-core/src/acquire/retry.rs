//! Bounded retry with an attempt counter.
use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first; 0 behaves as 1.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 0,
        }
    }
}

/// Every attempt failed; carries the last error.
#[derive(Error, Debug)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `op` until it succeeds or `policy.max_attempts` attempts have failed.
/// `op` receives the 1-based attempt number.
pub fn retry<T, E, F>(policy: &RetryPolicy, mut op: F) -> Result<T, Exhausted<E>>
where
    E: fmt::Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max => {
                debug!(attempt, max, error = %err, "attempt failed, retrying");
                if policy.backoff_ms > 0 {
                    thread::sleep(Duration::from_millis(policy.backoff_ms));
                }
                attempt += 1;
            }
            Err(last) => {
                return Err(Exhausted {
                    attempts: attempt,
                    last,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_after_transient_failures() {
        let mut calls = 0;
        let out = retry(&RetryPolicy::default(), |attempt| {
            calls += 1;
            if attempt < 3 {
                Err(format!("boom {attempt}"))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(out.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let out: Result<(), _> = retry(&RetryPolicy::default(), |attempt| {
            calls += 1;
            Err(format!("boom {attempt}"))
        });
        let err = out.unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last, "boom 3");
        assert_eq!(err.to_string(), "gave up after 3 attempts: boom 3");
    }

    #[test]
    fn exhausted_is_a_std_error() {
        let out: Result<(), _> = retry(&RetryPolicy::default(), |_| {
            Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"))
        });
        let err: Box<dyn std::error::Error> = Box::new(out.unwrap_err());
        assert_eq!(err.to_string(), "gave up after 3 attempts: slow");
    }

    #[test]
    fn first_success_makes_one_call() {
        let mut calls = 0;
        let out: Result<u8, Exhausted<String>> = retry(&RetryPolicy::default(), |_| {
            calls += 1;
            Ok(7)
        });
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff_ms: 0,
        };
        let mut calls = 0;
        let out: Result<(), _> = retry(&policy, |_| {
            calls += 1;
            Err("nope")
        });
        assert_eq!(out.unwrap_err().attempts, 1);
        assert_eq!(calls, 1);
    }
}
