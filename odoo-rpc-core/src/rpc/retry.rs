//! # Retry Policy
//!
//! [`Retrying`] wraps any [`Invoke`] implementation and drives each call through a small
//! state machine:
//!
//! ```text
//! Idle -> Attempting -> Success
//!             |  ^
//!             |  | connection error, attempts left (sleep `delay`)
//!             +--+
//!             |
//!             +-> Exhausted (terminal error, or no attempts left)
//! ```
//!
//! Only errors for which [`RpcError::is_retryable`] holds are retried. Remote faults,
//! authentication and protocol errors end the run after a single attempt.
use super::{Invoke, RpcCall};
use crate::error::RpcError;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Fixed-interval retry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn never() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Decides whether the run may continue after `attempt` attempts ended with `error`.
    pub fn should_retry(&self, error: &RpcError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPhase {
    #[default]
    Idle,
    Attempting,
    Success,
    Exhausted,
}

/// Progress of the current (or last finished) run.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    pub phase: RetryPhase,
    /// Attempts made so far in this run.
    pub attempt: u32,
    pub last_error: Option<RpcError>,
}

/// An [`Invoke`] implementation that retries transient failures of the wrapped invoker.
pub struct Retrying<I> {
    inner: I,
    policy: RetryPolicy,
    state: RetryState,
}

impl<I: Invoke> Retrying<I> {
    pub fn new(inner: I, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            state: RetryState::default(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn state(&self) -> &RetryState {
        &self.state
    }

    /// Forgets the last run, as if no call had been made.
    pub fn reset(&mut self) {
        self.state = RetryState::default();
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.inner
    }
}

impl<I: Invoke> Invoke for Retrying<I> {
    async fn invoke(&mut self, call: &RpcCall) -> Result<Value, RpcError> {
        self.state = RetryState {
            phase: RetryPhase::Attempting,
            attempt: 0,
            last_error: None,
        };

        loop {
            self.state.attempt += 1;

            let error = match self.inner.invoke(call).await {
                Ok(value) => {
                    self.state.phase = RetryPhase::Success;
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !self.policy.should_retry(&error, self.state.attempt) {
                self.state.phase = RetryPhase::Exhausted;
                self.state.last_error = Some(error.clone());
                return Err(error);
            }

            warn!(
                model = %call.model,
                method = %call.method,
                attempt = self.state.attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = self.policy.delay.as_millis() as u64,
                error = %error,
                "Call failed, retrying"
            );
            self.state.last_error = Some(error);

            tokio::time::sleep(self.policy.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    struct Flaky {
        outcomes: VecDeque<Result<Value, RpcError>>,
        calls: u32,
    }

    impl Flaky {
        fn new(outcomes: Vec<Result<Value, RpcError>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                calls: 0,
            }
        }
    }

    impl Invoke for Flaky {
        async fn invoke(&mut self, _call: &RpcCall) -> Result<Value, RpcError> {
            self.calls += 1;
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Err(refused()))
        }
    }

    fn refused() -> RpcError {
        RpcError::Connection {
            endpoint: "http://localhost:8069/jsonrpc".into(),
            reason: "connection refused".into(),
            timed_out: false,
        }
    }

    fn call() -> RpcCall {
        RpcCall::new("res.partner", "search_count").arg(json!([]))
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let mut retrying = Retrying::new(Flaky::new(vec![]), RetryPolicy::default());
        let started = Instant::now();

        let err = retrying.invoke(&call()).await.unwrap_err();

        assert!(matches!(err, RpcError::Connection { .. }));
        assert_eq!(retrying.inner().calls, 3);
        assert!(started.elapsed() >= DEFAULT_DELAY * 2);
        assert_eq!(retrying.state().phase, RetryPhase::Exhausted);
        assert_eq!(retrying.state().attempt, 3);
        assert!(retrying.state().last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_a_transient_failure() {
        let mut retrying = Retrying::new(
            Flaky::new(vec![Err(refused()), Ok(json!(42))]),
            RetryPolicy::default(),
        );

        let value = retrying.invoke(&call()).await.unwrap();

        assert_eq!(value, json!(42));
        assert_eq!(retrying.state().phase, RetryPhase::Success);
        assert_eq!(retrying.state().attempt, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_errors_are_not_retried() {
        let mut retrying = Retrying::new(
            Flaky::new(vec![Err(RpcError::Protocol("garbage".into()))]),
            RetryPolicy::default(),
        );
        let started = Instant::now();

        let err = retrying.invoke(&call()).await.unwrap_err();

        assert!(matches!(err, RpcError::Protocol(_)));
        assert_eq!(retrying.inner().calls, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(retrying.state().phase, RetryPhase::Exhausted);
    }

    #[test]
    fn zero_attempts_behaves_as_one() {
        let policy = RetryPolicy::new(0, DEFAULT_DELAY);
        assert!(!policy.should_retry(&refused(), 1));
        assert!(!RetryPolicy::never().should_retry(&refused(), 1));
    }
}
