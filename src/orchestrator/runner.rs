use std::sync::Arc;

use tracing::{debug, info, warn};

use super::schedule::PollSchedule;
use crate::assistant::{ChatAssistant, Run, RunStatus};
use crate::errors::{AssistantError, RunError};
use crate::retry::{RetryPolicy, retry};

/// Identifies one run on one conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub conversation_id: String,
    pub run_id: String,
}

/// Outcome of a run that completed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub status: RunStatus,
    /// Status polls it took to observe completion.
    pub polls: u32,
}

/// Drives runs on the assistant service from creation to a terminal status.
pub struct RunOrchestrator {
    assistant: Arc<dyn ChatAssistant>,
    schedule: PollSchedule,
    poll_retry: RetryPolicy,
}

impl RunOrchestrator {
    pub fn new(
        assistant: Arc<dyn ChatAssistant>,
        schedule: PollSchedule,
        poll_retry: RetryPolicy,
    ) -> Self {
        Self {
            assistant,
            schedule,
            poll_retry,
        }
    }

    /// Cancel every run on the thread that has not finished, and wait until each one
    /// has settled. Returns how many runs were cancelled.
    pub async fn cancel_active_runs(&self, conversation_id: &str) -> Result<usize, RunError> {
        let runs = retry(self.poll_retry, "list_runs", |_| {
            self.assistant.list_runs(conversation_id)
        })
        .await?;

        let mut cancelled = 0;
        for run in runs.into_iter().filter(|r| !r.status.is_terminal()) {
            info!(run_id = %run.id, status = %run.status, "cancelling stale run");
            let handle = RunHandle {
                conversation_id: conversation_id.to_string(),
                run_id: run.id.clone(),
            };
            if run.status != RunStatus::Cancelling {
                let requested = retry(self.poll_retry, "cancel_run", |_| {
                    self.assistant.cancel_run(conversation_id, &run.id)
                })
                .await;
                match requested {
                    Ok(_) => {}
                    // The run can finish between listing and cancelling; the service
                    // then rejects the cancel. Settling below sees the final status.
                    Err(AssistantError::Service {
                        status: Some(400), ..
                    }) => debug!(run_id = %run.id, "cancel rejected, run already finishing"),
                    Err(e) => return Err(e.into()),
                }
            }
            let settled = self.wait_for_terminal(&handle).await?;
            debug!(run_id = %settled.id, status = %settled.status, "stale run settled");
            cancelled += 1;
        }
        Ok(cancelled)
    }

    /// Start a new run after clearing any active ones.
    pub async fn start_run(
        &self,
        conversation_id: &str,
        instructions: &str,
    ) -> Result<RunHandle, RunError> {
        self.cancel_active_runs(conversation_id).await?;
        let run = self
            .assistant
            .start_run(conversation_id, instructions)
            .await?;
        debug!(run_id = %run.id, "run started");
        Ok(RunHandle {
            conversation_id: conversation_id.to_string(),
            run_id: run.id,
        })
    }

    /// Poll a run until it reaches a terminal status.
    ///
    /// `completed` is success; every other terminal status is an error carrying the
    /// service's reason. Exceeding the schedule's attempt cap fails with `TimedOut`.
    pub async fn run_to_completion(&self, handle: &RunHandle) -> Result<RunSummary, RunError> {
        let (run, polls) = self.poll_until_terminal(handle).await?;
        match run.status {
            RunStatus::Completed => {
                debug!(run_id = %run.id, polls, "run completed");
                Ok(RunSummary {
                    run_id: run.id,
                    status: run.status,
                    polls,
                })
            }
            RunStatus::Cancelled => {
                let reason = run.failure_reason();
                warn!(run_id = %run.id, %reason, "run was cancelled");
                Err(RunError::Cancelled {
                    run_id: run.id,
                    reason,
                })
            }
            _ => {
                let reason = run.failure_reason();
                warn!(run_id = %run.id, status = %run.status, %reason, "run failed");
                Err(RunError::Failed {
                    run_id: run.id,
                    reason,
                })
            }
        }
    }

    /// Start a run and wait for it to complete.
    pub async fn execute(
        &self,
        conversation_id: &str,
        instructions: &str,
    ) -> Result<RunSummary, RunError> {
        let handle = self.start_run(conversation_id, instructions).await?;
        self.run_to_completion(&handle).await
    }

    async fn wait_for_terminal(&self, handle: &RunHandle) -> Result<Run, RunError> {
        self.poll_until_terminal(handle).await.map(|(run, _)| run)
    }

    async fn poll_until_terminal(&self, handle: &RunHandle) -> Result<(Run, u32), RunError> {
        let max_attempts = self.schedule.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let run = retry(self.poll_retry, "get_run", |_| {
                self.assistant
                    .get_run(&handle.conversation_id, &handle.run_id)
            })
            .await?;
            debug!(run_id = %handle.run_id, attempt, status = %run.status, "polled run");

            if run.status.is_terminal() {
                return Ok((run, attempt));
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.schedule.delay_after(attempt)).await;
            }
        }
        warn!(
            run_id = %handle.run_id,
            attempts = max_attempts,
            waited = ?self.schedule.total_wait(max_attempts),
            "run did not finish in time"
        );
        Err(RunError::TimedOut {
            run_id: handle.run_id.clone(),
            attempts: max_attempts,
        })
    }
}
