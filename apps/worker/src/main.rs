//! Storefront background worker: follow-up dispatch and credential cleanup.

#![forbid(unsafe_code)]

mod schedule;
mod worker_config;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use storefront_application::{CredentialCleanupService, EmailService, FollowUpService};
use storefront_core::{AppError, AppResult};
use storefront_infrastructure::{
    ConsoleEmailService, PostgresFollowUpQueueRepository, PostgresRefreshTokenRepository,
    SmtpEmailService,
};
use tracing::{info, warn};

use crate::schedule::duration_until_next_midnight;
use crate::worker_config::{EmailProviderConfig, WorkerConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let email_service = build_email_service(&config.email_provider)?;
    let refresh_tokens = Arc::new(PostgresRefreshTokenRepository::new(pool.clone()));
    let follow_up_service = FollowUpService::new(
        Arc::new(PostgresFollowUpQueueRepository::new(pool)),
        email_service,
        refresh_tokens.clone(),
    );
    let cleanup_service = CredentialCleanupService::new(refresh_tokens);

    info!(
        batch_size = config.follow_up_batch_size,
        poll_interval_ms = config.poll_interval_ms,
        "storefront-worker started"
    );

    tokio::join!(
        run_follow_up_loop(&follow_up_service, &config),
        run_credential_sweep_loop(&cleanup_service),
    );

    Ok(())
}

async fn run_follow_up_loop(service: &FollowUpService, config: &WorkerConfig) {
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    loop {
        if let Err(error) = service.process_due(config.follow_up_batch_size).await {
            warn!(error = %error, "failed to process due follow-ups");
        }

        tokio::time::sleep(poll_interval).await;
    }
}

async fn run_credential_sweep_loop(service: &CredentialCleanupService) {
    loop {
        let wait = duration_until_next_midnight(Utc::now());
        info!(wait_seconds = wait.as_secs(), "next refresh token sweep scheduled");
        tokio::time::sleep(wait).await;

        // Failures are logged by the service; the next day still runs.
        service.run_scheduled_sweep(Utc::now()).await;
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_email_service(provider: &EmailProviderConfig) -> AppResult<Arc<dyn EmailService>> {
    let service: Arc<dyn EmailService> = match provider {
        EmailProviderConfig::Console => Arc::new(ConsoleEmailService::new()),
        EmailProviderConfig::Smtp(smtp) => Arc::new(SmtpEmailService::new(smtp.clone())?),
    };

    Ok(service)
}
