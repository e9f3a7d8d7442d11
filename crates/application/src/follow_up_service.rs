use std::sync::Arc;

use storefront_core::AppResult;
use storefront_domain::{FollowUpJob, FollowUpStatus, FollowUpTask, UserId};
use tracing::{info, warn};

use crate::{EmailService, FollowUpQueueRepository, RefreshTokenRepository};

/// What happened to a follow-up after one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpOutcome {
    /// The side effect ran and the job is done.
    Completed,
    /// The attempt failed and the job was rescheduled.
    Rescheduled,
    /// The attempt failed and the attempt budget is spent.
    Abandoned,
}

/// Counters for one batch of due follow-ups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowUpBatchSummary {
    /// Jobs claimed from the queue.
    pub claimed: usize,
    /// Jobs completed.
    pub completed: usize,
    /// Jobs rescheduled or abandoned.
    pub failed: usize,
}

/// Executes queued follow-ups and keeps their queue state current.
#[derive(Clone)]
pub struct FollowUpService {
    queue: Arc<dyn FollowUpQueueRepository>,
    email_service: Arc<dyn EmailService>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl FollowUpService {
    /// Creates a new follow-up service.
    #[must_use]
    pub fn new(
        queue: Arc<dyn FollowUpQueueRepository>,
        email_service: Arc<dyn EmailService>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
    ) -> Self {
        Self {
            queue,
            email_service,
            refresh_tokens,
        }
    }

    /// Runs one job and records the result in the queue.
    ///
    /// A failing side effect is not an error here; only a failure to update
    /// the queue itself is.
    pub async fn dispatch(&self, job: &FollowUpJob) -> AppResult<FollowUpOutcome> {
        match self.execute(&job.task).await {
            Ok(()) => {
                self.queue.mark_completed(job.id).await?;
                Ok(FollowUpOutcome::Completed)
            }
            Err(error) => {
                let failure = job.next_failure();
                warn!(
                    error = %error,
                    job_id = %job.id,
                    kind = job.task.kind(),
                    attempt = failure.attempt_count,
                    retry_in_seconds = failure.retry_delay_seconds,
                    "follow-up attempt failed"
                );
                self.queue
                    .mark_failed(job.id, failure, &error.to_string())
                    .await?;

                Ok(match failure.status {
                    FollowUpStatus::Failed => FollowUpOutcome::Abandoned,
                    _ => FollowUpOutcome::Rescheduled,
                })
            }
        }
    }

    /// Best-effort inline dispatch right after a commit. Never fails.
    pub async fn dispatch_all(&self, jobs: &[FollowUpJob]) {
        for job in jobs {
            if let Err(error) = self.dispatch(job).await {
                warn!(
                    error = %error,
                    job_id = %job.id,
                    "follow-up left for the background worker"
                );
            }
        }
    }

    /// Claims and dispatches up to `limit` due jobs.
    pub async fn process_due(&self, limit: usize) -> AppResult<FollowUpBatchSummary> {
        let jobs = self.queue.claim_due(limit).await?;
        let mut summary = FollowUpBatchSummary {
            claimed: jobs.len(),
            ..FollowUpBatchSummary::default()
        };

        for job in &jobs {
            match self.dispatch(job).await? {
                FollowUpOutcome::Completed => summary.completed += 1,
                FollowUpOutcome::Rescheduled | FollowUpOutcome::Abandoned => summary.failed += 1,
            }
        }

        if summary.claimed > 0 {
            info!(
                claimed = summary.claimed,
                completed = summary.completed,
                failed = summary.failed,
                "follow-up batch processed"
            );
        }

        Ok(summary)
    }

    async fn execute(&self, task: &FollowUpTask) -> AppResult<()> {
        match task {
            FollowUpTask::SendEmail { to, subject, body } => {
                self.email_service.send_email(to, subject, body, None).await
            }
            FollowUpTask::RevokeRefreshTokens { account_id } => {
                let deleted = self
                    .refresh_tokens
                    .delete_for_account(UserId::from_uuid(*account_id))
                    .await?;
                info!(account_id = %account_id, deleted, "revoked refresh tokens");
                Ok(())
            }
        }
    }
}
