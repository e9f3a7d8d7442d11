use async_trait::async_trait;

use storefront_core::AppResult;
use storefront_domain::{FollowUpFailure, FollowUpJob};

/// Repository port for the follow-up outbox.
#[async_trait]
pub trait FollowUpQueueRepository: Send + Sync {
    /// Leases up to `limit` due jobs so that concurrent dispatchers skip them.
    async fn claim_due(&self, limit: usize) -> AppResult<Vec<FollowUpJob>>;

    /// Marks a job as completed.
    async fn mark_completed(&self, job_id: uuid::Uuid) -> AppResult<()>;

    /// Records a failed attempt and reschedules or parks the job.
    async fn mark_failed(
        &self,
        job_id: uuid::Uuid,
        failure: FollowUpFailure,
        error_message: &str,
    ) -> AppResult<()>;
}
