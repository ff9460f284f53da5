//! Configuration convergence.
//!
//! Lambda rejects a configuration update while a previous mutation (such as
//! a code update) is still in progress. The converger retries conflicting
//! updates at a fixed interval until they succeed or a deadline passes.

use serde::Serialize;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::aws::{ComputeApi, ConfigurationUpdate};
use crate::config::DeploymentSpec;
use crate::error::{ReconcileError, Result};

/// Overall time budget for a convergence run.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);

/// Pause between conflicting attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Result of a successful convergence run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConvergenceReport {
    /// Number of update attempts, including the successful one.
    pub attempts: u32,
}

/// Applies a configuration update, retrying while the function is busy.
#[derive(Debug)]
pub struct ConfigurationConverger<'a, C: ComputeApi> {
    /// Compute API.
    compute: &'a C,
    /// Overall deadline measured from the start of `converge`.
    deadline: Duration,
    /// Fixed pause between attempts.
    retry_interval: Duration,
}

impl<'a, C: ComputeApi> ConfigurationConverger<'a, C> {
    /// Creates a converger with the default deadline and interval.
    #[must_use]
    pub const fn new(compute: &'a C) -> Self {
        Self {
            compute,
            deadline: DEFAULT_DEADLINE,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Sets the overall deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the pause between conflicting attempts.
    #[must_use]
    pub const fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Updates the function configuration until it is accepted.
    ///
    /// Only conflicts are retried. In-flight calls are never aborted by the
    /// deadline; it only decides whether another attempt is made. Dropping
    /// the returned future cancels the loop.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::DeadlineExceeded`] if the update still
    /// conflicts when the deadline passes, or the first non-conflict error.
    pub async fn converge(&self, spec: &DeploymentSpec) -> Result<ConvergenceReport> {
        let update = ConfigurationUpdate::from_spec(spec);
        let deadline = Instant::now() + self.deadline;
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            debug!(
                "Updating configuration of {} (attempt {attempts})",
                update.function_name
            );

            match self.compute.update_function_configuration(&update).await {
                Ok(()) => {
                    info!("Configuration of {} updated", update.function_name);
                    return Ok(ConvergenceReport { attempts });
                }
                Err(err) if err.is_conflict() => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(
                            "Configuration of {} still conflicting after {attempts} attempts, giving up",
                            update.function_name
                        );
                        return Err(ReconcileError::DeadlineExceeded {
                            function: update.function_name.clone(),
                            attempts,
                            deadline_secs: self.deadline.as_secs(),
                        }
                        .into());
                    }

                    warn!(
                        "Function {} is still being updated, retrying in {:?}",
                        update.function_name, self.retry_interval
                    );
                    sleep_until((now + self.retry_interval).min(deadline)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockComputeApi;
    use crate::error::{DeployError, RemoteError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn conflict() -> DeployError {
        RemoteError::Conflict {
            operation: "UpdateFunctionConfiguration",
            message: String::from("The operation cannot be performed at this time."),
        }
        .into()
    }

    fn spec() -> DeploymentSpec {
        let mut spec = DeploymentSpec::new("svc-a").with_zip_file("a.zip");
        spec.memory_mb = 256;
        spec
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_first_time() {
        let mut compute = MockComputeApi::new();
        compute
            .expect_update_function_configuration()
            .withf(|update| update.function_name == "svc-a" && update.memory_mb == Some(256))
            .times(1)
            .returning(|_| Ok(()));

        let started = Instant::now();
        let report = ConfigurationConverger::new(&compute)
            .converge(&spec())
            .await
            .expect("converged");

        assert_eq!(report.attempts, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_conflicts_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let mut compute = MockComputeApi::new();
        compute
            .expect_update_function_configuration()
            .times(3)
            .returning(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(conflict())
                } else {
                    Ok(())
                }
            });

        let started = Instant::now();
        let report = ConfigurationConverger::new(&compute)
            .converge(&spec())
            .await
            .expect("converged");

        assert_eq!(report.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), DEFAULT_RETRY_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_deadline() {
        let mut compute = MockComputeApi::new();
        compute
            .expect_update_function_configuration()
            .returning(|_| Err(conflict()));

        let started = Instant::now();
        let result = ConfigurationConverger::new(&compute).converge(&spec()).await;
        let elapsed = started.elapsed();

        match result {
            Err(DeployError::Reconcile(ReconcileError::DeadlineExceeded { attempts, deadline_secs, .. })) => {
                assert_eq!(attempts, 11);
                assert_eq!(deadline_secs, 20);
            }
            other => panic!("expected deadline exceeded, got {other:?}"),
        }
        assert!(elapsed >= DEFAULT_DEADLINE);
        assert!(elapsed <= DEFAULT_DEADLINE + DEFAULT_RETRY_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_sleep_clamped_to_deadline() {
        let mut compute = MockComputeApi::new();
        compute
            .expect_update_function_configuration()
            .times(4)
            .returning(|_| Err(conflict()));

        let started = Instant::now();
        let result = ConfigurationConverger::new(&compute)
            .with_deadline(Duration::from_secs(5))
            .converge(&spec())
            .await;

        assert!(result.as_ref().is_err_and(DeployError::is_deadline_exceeded));
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let mut compute = MockComputeApi::new();
        compute
            .expect_update_function_configuration()
            .times(1)
            .returning(|_| Err(RemoteError::api("UpdateFunctionConfiguration", "invalid role").into()));

        let result = ConfigurationConverger::new(&compute)
            .with_retry_interval(Duration::from_millis(100))
            .converge(&spec())
            .await;

        match result {
            Err(err) => {
                assert!(!err.is_conflict());
                assert!(!err.is_deadline_exceeded());
                assert!(err.to_string().contains("invalid role"));
            }
            Ok(report) => panic!("unexpected success: {report:?}"),
        }
    }
}
