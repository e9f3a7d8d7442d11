use std::sync::Arc;

use storefront_application::EmailService;
use storefront_core::AppError;
use storefront_infrastructure::{ConsoleEmailService, SmtpEmailConfig, SmtpEmailService};

use crate::api_config::EmailProviderConfig;

pub(super) fn build_email_service(
    provider: &EmailProviderConfig,
) -> Result<Arc<dyn EmailService>, AppError> {
    let service: Arc<dyn EmailService> = match provider {
        EmailProviderConfig::Console => Arc::new(ConsoleEmailService::new()),
        EmailProviderConfig::Smtp(smtp) => Arc::new(SmtpEmailService::new(SmtpEmailConfig {
            host: smtp.host.clone(),
            port: smtp.port,
            username: smtp.username.clone(),
            password: smtp.password.clone(),
            from_address: smtp.from_address.clone(),
        })?),
    };

    Ok(service)
}
