//! Outbox jobs carrying the non-critical side effects of account changes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attempts before a follow-up is parked as failed.
pub const FOLLOW_UP_MAX_ATTEMPTS: i32 = 5;

const FOLLOW_UP_BASE_DELAY_SECONDS: i64 = 30;
const FOLLOW_UP_MAX_DELAY_SECONDS: i64 = 3_600;

/// Side effect to run after an account change has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FollowUpTask {
    /// Notify the account holder.
    SendEmail {
        /// Recipient address.
        to: String,
        /// Message subject.
        subject: String,
        /// Plain-text body.
        body: String,
    },
    /// Force every session of the account to re-authenticate.
    RevokeRefreshTokens {
        /// Account whose refresh tokens are deleted.
        account_id: Uuid,
    },
}

impl FollowUpTask {
    /// Short label used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SendEmail { .. } => "send_email",
            Self::RevokeRefreshTokens { .. } => "revoke_refresh_tokens",
        }
    }
}

/// Queue state of a follow-up job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowUpStatus {
    /// Waiting for its next attempt.
    Pending,
    /// Leased by a dispatcher.
    Processing,
    /// Executed successfully.
    Completed,
    /// Gave up after the maximum number of attempts.
    Failed,
}

impl FollowUpStatus {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Queued follow-up job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpJob {
    /// Job identifier.
    pub id: Uuid,
    /// Work to perform.
    pub task: FollowUpTask,
    /// Attempts already made.
    pub attempt_count: i32,
    /// Attempt budget.
    pub max_attempts: i32,
}

impl FollowUpJob {
    /// Retry decision after one more failed attempt.
    #[must_use]
    pub fn next_failure(&self) -> FollowUpFailure {
        let attempt_count = self.attempt_count.saturating_add(1);
        let status = if attempt_count >= self.max_attempts {
            FollowUpStatus::Failed
        } else {
            FollowUpStatus::Pending
        };

        FollowUpFailure {
            attempt_count,
            status,
            retry_delay_seconds: follow_up_retry_delay_seconds(attempt_count),
        }
    }
}

/// State written back when an attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpFailure {
    /// Attempt counter including the failed attempt.
    pub attempt_count: i32,
    /// `Pending` to retry, `Failed` when the budget is spent.
    pub status: FollowUpStatus,
    /// Delay before the job becomes due again.
    pub retry_delay_seconds: i64,
}

/// Exponential backoff: 30s doubled per attempt, capped at one hour.
#[must_use]
pub fn follow_up_retry_delay_seconds(attempt_count: i32) -> i64 {
    let exponent = u32::try_from(attempt_count.clamp(0, 16)).unwrap_or(0);
    FOLLOW_UP_BASE_DELAY_SECONDS
        .saturating_mul(2_i64.saturating_pow(exponent))
        .min(FOLLOW_UP_MAX_DELAY_SECONDS)
}
