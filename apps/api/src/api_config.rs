use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use storefront_core::AppError;
use storefront_infrastructure::STRIPE_API_BASE_URL;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub struct StripeRuntimeConfig {
    pub secret_key: String,
    pub api_base_url: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub email_provider: EmailProviderConfig,
    pub stripe: StripeRuntimeConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        // `migrate` only needs the database connection.
        if migrate_only {
            return Ok(Self::for_migrations(database_url, frontend_url));
        }

        let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;
        let session_secret = required_env("SESSION_SECRET")?;
        if session_secret.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let email_provider = load_email_provider()?;

        let (default_success_url, default_cancel_url) = default_payment_redirects(&frontend_url);
        let stripe = StripeRuntimeConfig {
            secret_key: required_non_empty_env("STRIPE_SECRET_KEY")?,
            api_base_url: env::var("STRIPE_API_BASE_URL")
                .unwrap_or_else(|_| STRIPE_API_BASE_URL.to_owned()),
            success_url: env::var("PAYMENT_SUCCESS_URL").unwrap_or(default_success_url),
            cancel_url: env::var("PAYMENT_CANCEL_URL").unwrap_or(default_cancel_url),
        };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            email_provider,
            stripe,
        })
    }

    fn for_migrations(database_url: String, frontend_url: String) -> Self {
        let (success_url, cancel_url) = default_payment_redirects(&frontend_url);

        Self {
            migrate_only: true,
            database_url,
            frontend_url,
            bootstrap_token: String::new(),
            api_host: "127.0.0.1".to_owned(),
            api_port: 3001,
            cookie_secure: false,
            email_provider: EmailProviderConfig::Console,
            stripe: StripeRuntimeConfig {
                secret_key: String::new(),
                api_base_url: STRIPE_API_BASE_URL.to_owned(),
                success_url,
                cancel_url,
            },
        }
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

fn load_email_provider() -> Result<EmailProviderConfig, AppError> {
    match env::var("EMAIL_PROVIDER")
        .unwrap_or_else(|_| "console".to_owned())
        .as_str()
    {
        "console" => Ok(EmailProviderConfig::Console),
        "smtp" => {
            let port = required_non_empty_env("SMTP_PORT")?
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
            Ok(EmailProviderConfig::Smtp(SmtpRuntimeConfig {
                host: required_non_empty_env("SMTP_HOST")?,
                port,
                username: required_non_empty_env("SMTP_USERNAME")?,
                password: required_non_empty_env("SMTP_PASSWORD")?,
                from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
            }))
        }
        other => Err(AppError::Validation(format!(
            "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
        ))),
    }
}

/// Checkout landing pages under the frontend origin.
fn default_payment_redirects(frontend_url: &str) -> (String, String) {
    let base = frontend_url.trim_end_matches('/');
    (
        format!("{base}/checkout/success"),
        format!("{base}/checkout/cancel"),
    )
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
