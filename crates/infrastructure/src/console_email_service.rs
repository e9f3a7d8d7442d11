//! Email adapter that writes messages to the log instead of a mail relay.

use async_trait::async_trait;
use storefront_application::EmailService;
use storefront_core::AppResult;
use tracing::info;

/// Development email service; every message becomes one `info` event.
#[derive(Clone, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        info!(
            to,
            subject,
            has_html = html_body.is_some(),
            body = text_body,
            "email delivered to console"
        );

        Ok(())
    }
}
