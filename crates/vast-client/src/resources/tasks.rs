//! Cluster version and asynchronous task resources

use super::ResourceEntry;
use crate::error::{Error, Result};
use crate::observability;
use crate::record::{Record, json_type};
use serde_json::Value;
use std::cmp::Ordering;
use std::ops::Deref;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The `versions` resource, plus access to the client's version cache.
#[derive(Debug, Clone)]
pub struct Versions {
    entry: ResourceEntry,
}

impl Versions {
    pub(crate) fn new(entry: ResourceEntry) -> Self {
        Self { entry }
    }

    /// Core `major.minor.patch` version of the connected cluster.
    ///
    /// Fetched once and cached on the client.
    pub async fn get_version(&self) -> Result<semver::Version> {
        self.entry.client().cluster_version().await
    }

    /// Compare the cluster version with `other`.
    pub async fn compare_with(&self, other: &semver::Version) -> Result<Ordering> {
        self.entry.client().compare_version(other).await
    }

    /// Drop the cached cluster version so the next lookup refetches it.
    pub fn invalidate(&self) {
        self.entry.client().invalidate_version();
    }
}

impl Deref for Versions {
    type Target = ResourceEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

/// Polling schedule for [`VTasks::wait_task_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Maximum number of polls
    pub attempts: u32,
    /// Delay between polls
    pub interval: Duration,
    /// Factor applied to the interval after each poll
    pub backoff_rate: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_millis(500),
            backoff_rate: 1.0,
        }
    }
}

impl PollPolicy {
    /// Interval for the next poll. A negative or non-finite rate counts as 1
    /// and an overflowing product saturates.
    fn next_interval(&self, interval: Duration) -> Duration {
        let rate = if self.backoff_rate.is_finite() && self.backoff_rate >= 0.0 {
            self.backoff_rate
        } else {
            1.0
        };
        Duration::try_from_secs_f64(interval.as_secs_f64() * rate).unwrap_or(Duration::MAX)
    }
}

/// The `vtasks` resource.
#[derive(Debug, Clone)]
pub struct VTasks {
    entry: ResourceEntry,
}

enum Poll {
    Done(Record),
    Pending(String),
}

impl VTasks {
    pub(crate) fn new(entry: ResourceEntry) -> Self {
        Self { entry }
    }

    /// Wait for a task to complete with the default [`PollPolicy`].
    ///
    /// # Errors
    ///
    /// [`Error::TaskFailed`] or [`Error::TaskMessages`] when the task ends in a
    /// state other than `completed`, [`Error::TaskTimeout`] when it is still
    /// running after the last poll.
    pub async fn wait_task(&self, task_id: i64) -> Result<Record> {
        self.wait_task_with(task_id, PollPolicy::default(), CancellationToken::new())
            .await
    }

    /// Wait for a task to complete, observing `cancel` between polls.
    ///
    /// A `running` task and a failed fetch of the task are both retried until
    /// the policy's attempts run out.
    pub async fn wait_task_with(
        &self,
        task_id: i64,
        policy: PollPolicy,
        cancel: CancellationToken,
    ) -> Result<Record> {
        let mut interval = policy.interval;

        for attempt in 1..=policy.attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match self.poll(task_id).await {
                Ok(Poll::Done(task)) => {
                    observability::log_task_poll(task_id, attempt, "completed");
                    return Ok(task);
                }
                Ok(Poll::Pending(state)) => {
                    observability::log_task_poll(task_id, attempt, &state);
                }
                Err(e) if is_transient(&e) => {
                    tracing::debug!(task_id, attempt, error = %e, "Task poll failed, retrying");
                }
                Err(e) => return Err(e),
            }

            if attempt < policy.attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    _ = tokio::time::sleep(interval) => {}
                }
                interval = policy.next_interval(interval);
            }
        }

        Err(Error::TaskTimeout {
            id: task_id,
            attempts: policy.attempts,
        })
    }

    async fn poll(&self, task_id: i64) -> Result<Poll> {
        let task = self.entry.get_by_id(task_id).await?;
        let id = task.id()?;
        let name = display_value(task.get("name"));
        let state = display_value(task.get("state")).to_lowercase();

        match state.as_str() {
            "completed" => Ok(Poll::Done(task)),
            "running" => Ok(Poll::Pending(state)),
            _ => Err(task_failure(&task, name, id)),
        }
    }
}

impl Deref for VTasks {
    type Target = ResourceEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

fn task_failure(task: &Record, name: String, id: i64) -> Error {
    match task.get("messages") {
        Some(Value::Array(messages)) => match messages.last() {
            Some(last) => Error::TaskFailed {
                name,
                id,
                reason: display_value(Some(last)),
            },
            None => Error::TaskFailed {
                name,
                id,
                reason: "no messages found".to_string(),
            },
        },
        other => Error::TaskMessages {
            id,
            found: other.map_or("missing", json_type).to_string(),
        },
    }
}

fn is_transient(error: &Error) -> bool {
    matches!(
        error,
        Error::ServerUnreachable(_) | Error::Connection(_) | Error::Timeout(_)
    )
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
