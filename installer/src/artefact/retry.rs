//! Bounded retry for transient network failures.

use log::debug;
use std::time::Duration;

/// How many times a request may be attempted, and how long to wait between
/// attempts.
///
/// The wait grows linearly: after the first failure the policy sleeps for
/// `backoff`, after the second for `2 * backoff`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy. `attempts` is clamped to at least one.
    #[must_use]
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Total number of attempts, including the first.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Base delay between attempts.
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    ///
    /// `operation` receives the one-based attempt number. `is_transient`
    /// decides whether a failure is worth another attempt.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use modsync_installer::artefact::retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(3, Duration::ZERO);
    /// let result: Result<u32, &str> = policy.run(
    ///     |attempt| if attempt < 3 { Err("flaky") } else { Ok(attempt) },
    ///     |_| true,
    /// );
    /// assert_eq!(result, Ok(3));
    /// ```
    pub fn run<T, E, F, P>(&self, operation: F, is_transient: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        self.run_with_sleep(operation, is_transient, std::thread::sleep)
    }

    fn run_with_sleep<T, E, F, P, S>(
        &self,
        mut operation: F,
        is_transient: P,
        mut sleep: S,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        P: Fn(&E) -> bool,
        S: FnMut(Duration),
    {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.attempts && is_transient(&err) => {
                    let delay = self.backoff.saturating_mul(attempt);
                    debug!(
                        "attempt {attempt}/{} failed transiently; retrying in {delay:?}",
                        self.attempts
                    );
                    sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    #[derive(Debug, PartialEq, Eq)]
    enum Failure {
        Transient,
        Permanent,
    }

    fn is_transient(err: &Failure) -> bool {
        *err == Failure::Transient
    }

    #[test]
    fn succeeds_first_time_without_sleeping() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let sleeps = Cell::new(0);
        let result: Result<&str, Failure> =
            policy.run_with_sleep(|_| Ok("done"), is_transient, |_| sleeps.set(sleeps.get() + 1));
        assert_eq!(result, Ok("done"));
        assert_eq!(sleeps.get(), 0);
    }

    #[test]
    fn gives_up_after_attempt_budget() {
        let policy = RetryPolicy::new(4, Duration::from_millis(10));
        let calls = Cell::new(0);
        let mut delays = Vec::new();

        let result: Result<(), Failure> = policy.run_with_sleep(
            |_| {
                calls.set(calls.get() + 1);
                Err(Failure::Transient)
            },
            is_transient,
            |delay| delays.push(delay),
        );

        assert_eq!(result, Err(Failure::Transient));
        assert_eq!(calls.get(), 4);
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30),
            ]
        );
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let calls = Cell::new(0);
        let result: Result<(), Failure> = policy.run_with_sleep(
            |_| {
                calls.set(calls.get() + 1);
                Err(Failure::Permanent)
            },
            is_transient,
            |_| {},
        );
        assert_eq!(result, Err(Failure::Permanent));
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    #[case::zero_is_clamped(0, 1)]
    #[case::one(1, 1)]
    #[case::many(7, 7)]
    fn attempts_are_at_least_one(#[case] requested: u32, #[case] expected: u32) {
        assert_eq!(RetryPolicy::new(requested, Duration::ZERO).attempts(), expected);
    }
}
