//! SMTP email adapter built on `lettre`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use storefront_application::EmailService;
use storefront_core::{AppError, AppResult};

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// Relay hostname.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Relay username.
    pub username: String,
    /// Relay password.
    pub password: String,
    /// Sender mailbox, e.g. `Storefront <no-reply@example.com>`.
    pub from_address: String,
}

/// Email service delivering through an authenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpEmailService {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Validates the sender and prepares a pooled relay transport.
    pub fn new(config: SmtpEmailConfig) -> AppResult<Self> {
        let from = config.from_address.parse::<Mailbox>().map_err(|error| {
            AppError::Validation(format!("invalid SMTP sender address: {error}"))
        })?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|error| {
                AppError::Validation(format!("invalid SMTP relay '{}': {error}", config.host))
            })?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self { from, mailer })
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<Message> {
        let recipient = to.parse::<Mailbox>().map_err(|error| {
            AppError::Validation(format!("invalid recipient address '{to}': {error}"))
        })?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject);

        let message = match html_body {
            Some(html_body) => builder.multipart(MultiPart::alternative_plain_html(
                text_body.to_owned(),
                html_body.to_owned(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(text_body.to_owned()),
        };

        message.map_err(|error| AppError::Internal(format!("failed to build email: {error}")))
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        let message = self.build_message(to, subject, text_body, html_body)?;

        self.mailer.send(message).await.map_err(|error| {
            AppError::ExternalService(format!("SMTP relay rejected email: {error}"))
        })?;

        Ok(())
    }
}
