use std::env;

use storefront_core::{AppError, AppResult};
use storefront_infrastructure::SmtpEmailConfig;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpEmailConfig),
}

#[derive(Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub email_provider: EmailProviderConfig,
    pub follow_up_batch_size: usize,
    pub poll_interval_ms: u64,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let email_provider = load_email_provider(env::var("EMAIL_PROVIDER").ok().as_deref())?;
        let follow_up_batch_size = parse_env_usize(
            "WORKER_FOLLOW_UP_BATCH_SIZE",
            25,
            env::var("WORKER_FOLLOW_UP_BATCH_SIZE").ok(),
        )?;
        let poll_interval_ms = parse_env_u64(
            "WORKER_POLL_INTERVAL_MS",
            5000,
            env::var("WORKER_POLL_INTERVAL_MS").ok(),
        )?;

        if follow_up_batch_size == 0 {
            return Err(AppError::Validation(
                "WORKER_FOLLOW_UP_BATCH_SIZE must be greater than zero".to_owned(),
            ));
        }

        if poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "WORKER_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            email_provider,
            follow_up_batch_size,
            poll_interval_ms,
        })
    }
}

fn load_email_provider(provider: Option<&str>) -> AppResult<EmailProviderConfig> {
    match provider.unwrap_or("console") {
        "console" => Ok(EmailProviderConfig::Console),
        "smtp" => {
            let port = required_env("SMTP_PORT")?
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
            Ok(EmailProviderConfig::Smtp(SmtpEmailConfig {
                host: required_env("SMTP_HOST")?,
                port,
                username: required_env("SMTP_USERNAME")?,
                password: required_env("SMTP_PASSWORD")?,
                from_address: required_env("SMTP_FROM_ADDRESS")?,
            }))
        }
        other => Err(AppError::Validation(format!(
            "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
        ))),
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_env_usize(name: &str, default: usize, value: Option<String>) -> AppResult<usize> {
    match value {
        Some(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64, value: Option<String>) -> AppResult<u64> {
    match value {
        Some(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
