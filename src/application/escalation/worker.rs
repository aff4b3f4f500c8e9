//! Escalation worker - runs dispatches in the background.
//!
//! Jobs are tracked in a `JoinSet` and bounded by a semaphore. The turn that
//! submitted a job never waits for it. On shutdown `drain` stops intake and
//! waits for in-flight jobs up to a deadline, aborting whatever is left.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use super::dispatcher::{ChannelOutcome, EscalationDispatcher};
use crate::domain::escalation::EscalationKind;
use crate::domain::foundation::ConversationKey;
use crate::ports::DispatchPayload;

/// One escalation to deliver. Owns an immutable snapshot of what to send.
#[derive(Debug, Clone)]
pub struct EscalationJob {
    pub kind: EscalationKind,
    pub conversation: ConversationKey,
    pub payload: DispatchPayload,
}

/// Summary of a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub completed: usize,
    pub aborted: usize,
}

pub struct EscalationWorker {
    dispatcher: Arc<EscalationDispatcher>,
    tasks: Mutex<JoinSet<Vec<ChannelOutcome>>>,
    semaphore: Arc<Semaphore>,
    closed: AtomicBool,
}

fn log_join_result(result: Result<Vec<ChannelOutcome>, JoinError>) {
    match result {
        Ok(outcomes) => {
            let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
            tracing::debug!(delivered, attempted = outcomes.len(), "Escalation job finished");
        }
        Err(e) if e.is_panic() => tracing::error!(error = %e, "Escalation job panicked"),
        Err(e) => tracing::warn!(error = %e, "Escalation job cancelled"),
    }
}

impl EscalationWorker {
    pub fn new(dispatcher: Arc<EscalationDispatcher>, max_concurrency: usize) -> Self {
        Self {
            dispatcher,
            tasks: Mutex::new(JoinSet::new()),
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Queues a job. Returns `false` once draining has started.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, job: EscalationJob) -> bool {
        let Ok(mut tasks) = self.tasks.lock() else {
            tracing::error!("Escalation task set poisoned");
            return false;
        };

        // Checked under the task lock so a concurrent drain cannot take the
        // set between the check and the spawn.
        if self.is_closed() {
            tracing::warn!(
                conversation = %job.conversation,
                kind = job.kind.as_str(),
                "Escalation rejected, worker is draining"
            );
            return false;
        }

        while let Some(result) = tasks.try_join_next() {
            log_join_result(result);
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let semaphore = Arc::clone(&self.semaphore);
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return Vec::new();
            };
            tracing::info!(
                conversation = %job.conversation,
                kind = job.kind.as_str(),
                "Dispatching escalation"
            );
            dispatcher.dispatch(&job.payload).await
        });

        true
    }

    /// Takes the tracked jobs, optionally closing intake under the same lock.
    fn take_tasks(&self, close: bool) -> JoinSet<Vec<ChannelOutcome>> {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if close {
            self.closed.store(true, Ordering::SeqCst);
        }
        std::mem::take(&mut *tasks)
    }

    /// Waits for every job submitted so far. Intake stays open.
    pub async fn flush(&self) -> Vec<Vec<ChannelOutcome>> {
        let mut tasks = self.take_tasks(false);
        let mut finished = Vec::new();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(outcomes) => finished.push(outcomes),
                Err(e) => log_join_result(Err(e)),
            }
        }
        finished
    }

    /// Stops intake and waits up to `timeout` for in-flight jobs.
    pub async fn drain(&self, timeout: Duration) -> DrainReport {
        let mut tasks = self.take_tasks(true);
        let total = tasks.len();
        tracing::info!(in_flight = total, "Draining escalation worker");

        let mut completed = 0;
        let joined = tokio::time::timeout(timeout, async {
            while let Some(result) = tasks.join_next().await {
                log_join_result(result);
                completed += 1;
            }
        })
        .await;

        if joined.is_err() {
            tracing::warn!(
                remaining = tasks.len(),
                "Escalation drain timed out, aborting remaining jobs"
            );
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        let report = DrainReport {
            completed,
            aborted: total - completed,
        };
        tracing::info!(completed = report.completed, aborted = report.aborted, "Escalation worker drained");
        report
    }
}
