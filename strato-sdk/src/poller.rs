//! Convergence polling for asynchronously provisioned resources.
//!
//! A mutating call returns immediately while the server settles the resource
//! in the background. [`converge`] wraps a caller-supplied read action and
//! drives it until the observed lifecycle state satisfies a [`StateCheck`]
//! or the [`RetryBudget`] runs out. The action's own errors are never
//! retried - a transport or validation failure is a different failure class
//! than slow convergence and propagates immediately.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// How long to wait before the first read, between reads, and how many reads
/// to allow before giving up.
///
/// The interval is fixed; it does not scale with the attempt count.
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl RetryBudget {
    /// `max_attempts` is clamped to at least one observation.
    pub fn new(initial_delay: Duration, interval: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            interval,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Predicate over an observed lifecycle state.
///
/// The default is exact string equality; `any_of` and `matches` allow richer
/// expectations (e.g. "any terminal state") without changing the poll loop.
pub struct StateCheck {
    description: String,
    matcher: Box<dyn Fn(&str) -> bool + Send + Sync>,
}

impl StateCheck {
    /// Exact-equality check against one expected state.
    pub fn equals(expected: &str) -> Self {
        let want = expected.to_string();
        Self {
            description: expected.to_string(),
            matcher: Box::new(move |state| state == want),
        }
    }

    /// Accept any of the given states.
    pub fn any_of(states: &[&str]) -> Self {
        let want: Vec<String> = states.iter().map(|s| s.to_string()).collect();
        Self {
            description: want.join("|"),
            matcher: Box::new(move |state| want.iter().any(|w| w == state)),
        }
    }

    /// Custom predicate; `description` is used in failure reports.
    pub fn matches<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            matcher: Box::new(predicate),
        }
    }

    pub fn matched(&self, state: &str) -> bool {
        (self.matcher)(state)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for StateCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCheck")
            .field("description", &self.description)
            .finish()
    }
}

/// Poll failure, distinguishable from the wrapped action's own errors.
#[derive(Debug, Error)]
pub enum PollError<E: std::error::Error> {
    /// The budget ran out before the expected state was observed. Carries
    /// everything a failure report needs to tell "stuck resource" apart from
    /// "API unreachable".
    #[error("{operation}: state {expected:?} not reached after {attempts} attempts")]
    BudgetExhausted {
        operation: String,
        expected: String,
        attempts: u32,
    },

    /// The read action failed; surfaced as-is, never retried.
    #[error(transparent)]
    Action(#[from] E),
}

impl<E: std::error::Error> PollError<E> {
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, PollError::BudgetExhausted { .. })
    }
}

/// Poll `action` until the state it reports satisfies `check`.
///
/// Sleeps `initial_delay` once, then invokes `action` up to `max_attempts`
/// times with `interval` between invocations. Attempts are strictly
/// sequential. On a match the latest snapshot is returned so the caller can
/// run its own field-level assertions against it. Dropping the returned
/// future is the cancellation path; the poller holds no out-of-band signal.
pub async fn converge<T, E, F, Fut>(
    operation: &str,
    budget: RetryBudget,
    check: &StateCheck,
    mut action: F,
) -> Result<T, PollError<E>>
where
    E: std::error::Error,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, String), E>>,
{
    if !budget.initial_delay.is_zero() {
        tokio::time::sleep(budget.initial_delay).await;
    }

    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let (snapshot, state) = action().await?;
        if check.matched(&state) {
            debug!(operation, attempts, state = %state, "converged");
            return Ok(snapshot);
        }
        if attempts >= budget.max_attempts {
            return Err(PollError::BudgetExhausted {
                operation: operation.to_string(),
                expected: check.description().to_string(),
                attempts,
            });
        }
        debug!(
            operation,
            attempt = attempts,
            state = %state,
            expected = check.description(),
            "state not yet reached, retrying"
        );
        tokio::time::sleep(budget.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn budget(initial_ms: u64, interval_ms: u64, max_attempts: u32) -> RetryBudget {
        RetryBudget::new(
            Duration::from_millis(initial_ms),
            Duration::from_millis(interval_ms),
            max_attempts,
        )
    }

    /// Action that walks through the scripted states, one per invocation,
    /// then keeps repeating the last one.
    fn scripted(
        calls: Arc<AtomicU32>,
        states: &'static [&'static str],
    ) -> impl FnMut() -> std::pin::Pin<
        Box<dyn Future<Output = Result<(&'static str, String), ClientError>> + Send>,
    > {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
            let state = states[n.min(states.len() - 1)];
            Box::pin(async move { Ok(("snapshot", state.to_string())) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_match_invokes_action_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = converge(
            "instances/web-0",
            budget(500, 1000, 5),
            &StateCheck::equals("Active"),
            scripted(calls.clone(), &["Active"]),
        )
        .await
        .unwrap();

        assert_eq!(result, "snapshot");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Only the initial delay was slept, no intervals.
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));

        let err = converge(
            "instances/web-0",
            budget(0, 100, 3),
            &StateCheck::equals("Active"),
            scripted(calls.clone(), &["Creating"]),
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(err.is_budget_exhausted());
        match err {
            PollError::BudgetExhausted {
                operation,
                expected,
                attempts,
            } => {
                assert_eq!(operation, "instances/web-0");
                assert_eq!(expected, "Active");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn action_error_propagates_without_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let inner = calls.clone();

        let err = converge(
            "instances/web-0",
            budget(0, 100, 10),
            &StateCheck::equals("Active"),
            move || {
                let n = inner.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(("snapshot", "Creating".to_string()))
                    } else {
                        Err(ClientError::Api {
                            status: 500,
                            message: "boom".to_string(),
                        })
                    }
                }
            },
        )
        .await
        .unwrap_err();

        // Errored on the second attempt: exactly two invocations, no retry.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match err {
            PollError::Action(ClientError::Api { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn creating_creating_active_sleeps_twice() {
        // Concrete scenario: no initial delay, interval 1s, three attempts,
        // reads return Creating, Creating, Active.
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = converge(
            "instances/web-0",
            budget(0, 1000, 3),
            &StateCheck::equals("Active"),
            scripted(calls.clone(), &["Creating", "Creating", "Active"]),
        )
        .await
        .unwrap();

        assert_eq!(result, "snapshot");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two interval sleeps, between calls 1->2 and 2->3.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_budget_means_one_observation() {
        let calls = Arc::new(AtomicU32::new(0));

        let err = converge(
            "volumes/data-0",
            budget(0, 1000, 1),
            &StateCheck::equals("Active"),
            scripted(calls.clone(), &["Creating"]),
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.is_budget_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn any_of_accepts_either_state() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = converge(
            "instances/web-0",
            budget(0, 100, 5),
            &StateCheck::any_of(&["Active", "Suspended"]),
            scripted(calls.clone(), &["Creating", "Suspended"]),
        )
        .await
        .unwrap();

        assert_eq!(result, "snapshot");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_max_attempts_is_clamped() {
        let b = RetryBudget::new(Duration::ZERO, Duration::ZERO, 0);
        assert_eq!(b.max_attempts, 1);
    }

    #[test]
    fn equality_check_is_exact() {
        let check = StateCheck::equals("Active");
        assert!(check.matched("Active"));
        assert!(!check.matched("Activating"));
        assert!(!check.matched("active"));
    }
}
