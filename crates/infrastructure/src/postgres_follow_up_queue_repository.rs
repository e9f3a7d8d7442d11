use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use storefront_application::FollowUpQueueRepository;
use storefront_core::{AppError, AppResult};
use storefront_domain::{
    FOLLOW_UP_MAX_ATTEMPTS, FollowUpFailure, FollowUpJob, FollowUpStatus, FollowUpTask,
};

/// Seconds a claimed job stays invisible to other dispatchers.
const FOLLOW_UP_LEASE_SECONDS: i32 = 120;

/// PostgreSQL-backed follow-up outbox.
#[derive(Clone)]
pub struct PostgresFollowUpQueueRepository {
    pool: PgPool,
}

impl PostgresFollowUpQueueRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ClaimedFollowUpRow {
    id: Uuid,
    payload: Value,
    attempt_count: i32,
    max_attempts: i32,
}

impl TryFrom<ClaimedFollowUpRow> for FollowUpJob {
    type Error = AppError;

    fn try_from(row: ClaimedFollowUpRow) -> Result<Self, Self::Error> {
        let task = serde_json::from_value::<FollowUpTask>(row.payload).map_err(|error| {
            AppError::Internal(format!("invalid follow-up payload format: {error}"))
        })?;

        Ok(Self {
            id: row.id,
            task,
            attempt_count: row.attempt_count,
            max_attempts: row.max_attempts,
        })
    }
}

/// Enqueues follow-ups inside the caller's transaction.
///
/// Jobs start leased to the caller, which dispatches them right after
/// commit; the worker only picks them up once the lease runs out.
pub(crate) async fn enqueue_follow_ups(
    connection: &mut PgConnection,
    tasks: Vec<FollowUpTask>,
) -> AppResult<Vec<FollowUpJob>> {
    let mut jobs = Vec::with_capacity(tasks.len());
    for task in tasks {
        let job = FollowUpJob {
            id: Uuid::new_v4(),
            task,
            attempt_count: 0,
            max_attempts: FOLLOW_UP_MAX_ATTEMPTS,
        };
        let payload = serde_json::to_value(&job.task).map_err(|error| {
            AppError::Internal(format!("failed to encode follow-up payload: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO account_follow_ups (
                id,
                kind,
                payload,
                status,
                attempt_count,
                max_attempts,
                next_attempt_at
            )
            VALUES ($1, $2, $3, $4, 0, $5, now() + make_interval(secs => $6))
            "#,
        )
        .bind(job.id)
        .bind(job.task.kind())
        .bind(payload)
        .bind(FollowUpStatus::Processing.as_str())
        .bind(job.max_attempts)
        .bind(FOLLOW_UP_LEASE_SECONDS)
        .execute(&mut *connection)
        .await
        .map_err(|error| AppError::Internal(format!("failed to enqueue follow-up: {error}")))?;

        jobs.push(job);
    }

    Ok(jobs)
}

#[async_trait]
impl FollowUpQueueRepository for PostgresFollowUpQueueRepository {
    async fn claim_due(&self, limit: usize) -> AppResult<Vec<FollowUpJob>> {
        let rows = sqlx::query_as::<_, ClaimedFollowUpRow>(
            r#"
            WITH candidates AS (
                SELECT id
                FROM account_follow_ups
                WHERE status IN ('pending', 'processing')
                  AND next_attempt_at <= now()
                ORDER BY next_attempt_at ASC, created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE account_follow_ups AS jobs
            SET status = 'processing',
                updated_at = now(),
                next_attempt_at = now() + make_interval(secs => $2)
            FROM candidates
            WHERE jobs.id = candidates.id
            RETURNING jobs.id, jobs.payload, jobs.attempt_count, jobs.max_attempts
            "#,
        )
        .bind(i64::try_from(limit).map_err(|error| {
            AppError::Internal(format!("invalid follow-up batch size conversion: {error}"))
        })?)
        .bind(FOLLOW_UP_LEASE_SECONDS)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to claim follow-ups: {error}")))?;

        rows.into_iter().map(FollowUpJob::try_from).collect()
    }

    async fn mark_completed(&self, job_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE account_follow_ups
            SET status = 'completed',
                attempt_count = attempt_count + 1,
                last_error = NULL,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to mark follow-up completed: {error}"))
        })?;

        Ok(())
    }

    async fn mark_failed(
        &self,
        job_id: Uuid,
        failure: FollowUpFailure,
        error_message: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE account_follow_ups
            SET
                status = $2,
                attempt_count = $3,
                next_attempt_at = now() + make_interval(secs => $4),
                last_error = $5,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(failure.status.as_str())
        .bind(failure.attempt_count)
        .bind(i32::try_from(failure.retry_delay_seconds).map_err(|error| {
            AppError::Internal(format!("invalid follow-up backoff conversion: {error}"))
        })?)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update follow-up retry state: {error}"))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
