use sqlx::PgPool;
use storefront_application::FollowUpQueueRepository;
use storefront_domain::{FollowUpStatus, FollowUpTask};
use uuid::Uuid;

use crate::test_support::test_pool;

use super::{PostgresFollowUpQueueRepository, enqueue_follow_ups};

async fn enqueue_one(pool: &PgPool, task: FollowUpTask) -> Uuid {
    let mut transaction = pool.begin().await.unwrap_or_else(|_| panic!("test"));
    let jobs = enqueue_follow_ups(&mut *transaction, vec![task])
        .await
        .unwrap_or_else(|_| panic!("test"));
    transaction.commit().await.unwrap_or_else(|_| panic!("test"));
    jobs[0].id
}

async fn make_due(pool: &PgPool, job_id: Uuid) {
    let update = sqlx::query(
        "UPDATE account_follow_ups SET next_attempt_at = now() - interval '1 second' WHERE id = $1",
    )
    .bind(job_id)
    .execute(pool)
    .await;
    assert!(update.is_ok());
}

async fn status_of(pool: &PgPool, job_id: Uuid) -> (String, i32, Option<String>) {
    sqlx::query_as::<_, (String, i32, Option<String>)>(
        "SELECT status, attempt_count, last_error FROM account_follow_ups WHERE id = $1",
    )
    .bind(job_id)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|_| panic!("test"))
}

#[tokio::test]
async fn fresh_jobs_stay_leased_to_the_enqueuer() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let job_id = enqueue_one(
        &pool,
        FollowUpTask::RevokeRefreshTokens {
            account_id: Uuid::new_v4(),
        },
    )
    .await;

    let (status, attempts, _) = status_of(&pool, job_id).await;
    assert_eq!(status, FollowUpStatus::Processing.as_str());
    assert_eq!(attempts, 0);

    let leased = sqlx::query_scalar::<_, bool>(
        "SELECT next_attempt_at > now() FROM account_follow_ups WHERE id = $1",
    )
    .bind(job_id)
    .fetch_one(&pool)
    .await
    .unwrap_or_else(|_| panic!("test"));
    assert!(leased);
}

#[tokio::test]
async fn failed_job_is_rescheduled_then_claimable_once_due() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresFollowUpQueueRepository::new(pool.clone());
    let task = FollowUpTask::SendEmail {
        to: "buyer@example.com".to_owned(),
        subject: "Assigned Individual Seller Role".to_owned(),
        body: "You have been assigned the SELLER role.".to_owned(),
    };
    let job_id = enqueue_one(&pool, task.clone()).await;
    make_due(&pool, job_id).await;

    let claimed = repository
        .claim_due(1_000)
        .await
        .unwrap_or_else(|_| panic!("test"));
    let job = claimed
        .into_iter()
        .find(|job| job.id == job_id)
        .unwrap_or_else(|| panic!("job should be claimable"));
    assert_eq!(job.task, task);

    let failure = job.next_failure();
    let marked = repository
        .mark_failed(job_id, failure, "smtp relay timed out")
        .await;
    assert!(marked.is_ok());

    let (status, attempts, last_error) = status_of(&pool, job_id).await;
    assert_eq!(status, FollowUpStatus::Pending.as_str());
    assert_eq!(attempts, 1);
    assert_eq!(last_error.as_deref(), Some("smtp relay timed out"));

    let not_yet = repository
        .claim_due(1_000)
        .await
        .unwrap_or_else(|_| panic!("test"));
    assert!(not_yet.iter().all(|job| job.id != job_id));

    make_due(&pool, job_id).await;
    let retried = repository
        .claim_due(1_000)
        .await
        .unwrap_or_else(|_| panic!("test"));
    assert!(retried.iter().any(|job| job.id == job_id && job.attempt_count == 1));

    assert!(repository.mark_completed(job_id).await.is_ok());
    let (status, _, last_error) = status_of(&pool, job_id).await;
    assert_eq!(status, FollowUpStatus::Completed.as_str());
    assert!(last_error.is_none());
}
