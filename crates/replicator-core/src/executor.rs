//! Named, deadline-bounded units of work.
//!
//! [`TaskExecutor`] is how the scheduler and the pipelines run anything
//! that may stall: every unit gets a name, a `tracing` span and a timeout,
//! and comes back as a typed [`TaskError`] instead of hanging or
//! panicking through the caller.
//!
//! - [`TaskExecutor::run`] awaits one unit inline. Units can nest; a
//!   pipeline running under one deadline runs its decision call under
//!   another.
//! - [`TaskExecutor::spawn_all`] fans units out onto the runtime and fans
//!   the results back in, one slot per input, in input order.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{Instrument, debug, info_span, warn};

/// Why a unit of work produced no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The deadline passed first.
    #[error("task {task} timed out after {timeout_ms}ms")]
    TimedOut {
        /// Task name.
        task: String,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The task returned an error, panicked, or was cancelled.
    #[error("task {task} failed: {message}")]
    Failed {
        /// Task name.
        task: String,
        /// What went wrong.
        message: String,
    },
}

impl TaskError {
    /// The name of the task that failed.
    pub fn task(&self) -> &str {
        match self {
            Self::TimedOut { task, .. } | Self::Failed { task, .. } => task,
        }
    }
}

/// Runs named units of work under deadlines.
///
/// The scope names the owner (a tick, a pipeline) and is attached to every
/// task span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskExecutor {
    scope: &'static str,
}

impl TaskExecutor {
    /// Create an executor for `scope`.
    pub const fn new(scope: &'static str) -> Self {
        Self { scope }
    }

    /// The scope attached to task spans.
    pub const fn scope(&self) -> &'static str {
        self.scope
    }

    /// Await `work` under `timeout`.
    ///
    /// An `Err` from `work` becomes [`TaskError::Failed`] carrying its
    /// message; a missed deadline becomes [`TaskError::TimedOut`] and drops
    /// `work`.
    pub async fn run<T, E, F>(&self, task: &str, timeout: Duration, work: F) -> Result<T, TaskError>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let span = info_span!("task", scope = self.scope, task);
        match tokio::time::timeout(timeout, work.instrument(span)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(TaskError::Failed {
                task: task.to_owned(),
                message: err.to_string(),
            }),
            Err(_elapsed) => {
                debug!(
                    scope = self.scope,
                    task,
                    timeout_ms = duration_ms(timeout),
                    "Task timed out"
                );
                Err(TaskError::TimedOut {
                    task: task.to_owned(),
                    timeout_ms: duration_ms(timeout),
                })
            }
        }
    }

    /// Spawn every unit concurrently and collect their results.
    ///
    /// Each unit runs on its own runtime task under `timeout`. The returned
    /// vector has one entry per input, in input order, whatever order the
    /// units finish in. A unit that times out, panics or is cancelled fails
    /// only its own slot.
    pub async fn spawn_all<T, F, I>(&self, timeout: Duration, units: I) -> Vec<Result<T, TaskError>>
    where
        I: IntoIterator<Item = (String, F)>,
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
    {
        let scope = self.scope;
        let handles: Vec<(String, tokio::task::JoinHandle<Result<T, TaskError>>)> = units
            .into_iter()
            .map(|(task, work)| {
                let span = info_span!("task", scope, task = task.as_str());
                let name = task.clone();
                let handle = tokio::spawn(
                    async move {
                        tokio::time::timeout(timeout, work)
                            .await
                            .unwrap_or_else(|_elapsed| {
                                Err(TaskError::TimedOut {
                                    task: name,
                                    timeout_ms: duration_ms(timeout),
                                })
                            })
                    }
                    .instrument(span),
                );
                (task, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (task, handle) in handles {
            let result = handle.await.unwrap_or_else(|join_err| {
                warn!(scope, task = task.as_str(), error = %join_err, "Task aborted");
                Err(TaskError::Failed {
                    message: if join_err.is_panic() {
                        String::from("task panicked")
                    } else {
                        String::from("task was cancelled")
                    },
                    task,
                })
            });
            results.push(result);
        }
        results
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;

    #[tokio::test]
    async fn run_passes_values_and_errors_through() {
        let executor = TaskExecutor::new("test");
        assert_eq!(executor.scope(), "test");
        let ok = executor
            .run("ok", Duration::from_secs(1), async { Ok::<_, String>(7) })
            .await;
        assert_eq!(ok, Ok(7));

        let failed = executor
            .run("bad", Duration::from_secs(1), async {
                Err::<u8, _>(String::from("boom"))
            })
            .await;
        assert_eq!(
            failed,
            Err(TaskError::Failed {
                task: String::from("bad"),
                message: String::from("boom")
            })
        );
    }

    #[tokio::test]
    async fn run_enforces_deadline() {
        let result = TaskExecutor::new("test")
            .run(
                "slow",
                Duration::from_millis(10),
                futures::future::pending::<Result<(), String>>(),
            )
            .await;
        assert_eq!(
            result,
            Err(TaskError::TimedOut {
                task: String::from("slow"),
                timeout_ms: 10
            })
        );
    }

    #[tokio::test]
    async fn spawn_all_keeps_input_order_and_isolates_failures() {
        let units: Vec<(String, BoxFuture<'static, Result<u64, TaskError>>)> = vec![
            (
                String::from("late"),
                Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(1)
                }),
            ),
            (
                String::from("panics"),
                Box::pin(async { panic!("unit blew up") }),
            ),
            (
                String::from("hangs"),
                Box::pin(futures::future::pending()),
            ),
            (String::from("early"), Box::pin(async { Ok(4) })),
        ];

        let results = TaskExecutor::new("test")
            .spawn_all(Duration::from_millis(200), units)
            .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.first(), Some(&Ok(1)));
        assert!(matches!(
            results.get(1),
            Some(Err(TaskError::Failed { message, .. })) if message == "task panicked"
        ));
        assert!(matches!(
            results.get(2),
            Some(Err(TaskError::TimedOut { task, .. })) if task == "hangs"
        ));
        assert_eq!(results.get(3), Some(&Ok(4)));
    }
}
