use std::sync::Arc;

use chrono::{DateTime, Utc};
use storefront_core::AppResult;
use tracing::{error, info};

use crate::RefreshTokenRepository;

/// Periodic removal of dead refresh credentials.
#[derive(Clone)]
pub struct CredentialCleanupService {
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl CredentialCleanupService {
    /// Creates a new cleanup service.
    #[must_use]
    pub fn new(refresh_tokens: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { refresh_tokens }
    }

    /// Deletes revoked tokens and tokens that expired before `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let deleted = self.refresh_tokens.delete_expired_or_revoked(now).await?;
        info!(deleted, "refresh token sweep finished");
        Ok(deleted)
    }

    /// Scheduler entry point: logs failures instead of returning them so
    /// the next tick still runs.
    pub async fn run_scheduled_sweep(&self, now: DateTime<Utc>) -> Option<u64> {
        match self.sweep(now).await {
            Ok(deleted) => Some(deleted),
            Err(error) => {
                error!(error = %error, "refresh token sweep failed");
                None
            }
        }
    }
}
