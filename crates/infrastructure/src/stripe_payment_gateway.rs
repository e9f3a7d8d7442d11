//! Stripe hosted checkout adapter.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use storefront_application::{CheckoutSession, CheckoutSessionRequest, PaymentGateway};
use storefront_core::{AppError, AppResult};

/// Public Stripe API endpoint.
pub const STRIPE_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe credentials and endpoint.
#[derive(Debug, Clone)]
pub struct StripeGatewayConfig {
    /// Secret API key used as bearer credential.
    pub secret_key: String,
    /// API base URL, overridable for tests and proxies.
    pub api_base_url: String,
}

/// Payment gateway backed by Stripe Checkout Sessions.
pub struct StripePaymentGateway {
    http_client: reqwest::Client,
    secret_key: String,
    api_base_url: Url,
}

impl StripePaymentGateway {
    /// Creates a gateway from a shared HTTP client.
    pub fn new(http_client: reqwest::Client, config: StripeGatewayConfig) -> AppResult<Self> {
        if config.secret_key.trim().is_empty() {
            return Err(AppError::Validation(
                "stripe secret key must not be empty".to_owned(),
            ));
        }

        let api_base_url = Url::parse(&config.api_base_url).map_err(|error| {
            AppError::Validation(format!("invalid stripe api base url: {error}"))
        })?;

        Ok(Self {
            http_client,
            secret_key: config.secret_key,
            api_base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::Internal("stripe api base url cannot hold a path".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_session(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> AppResult<CheckoutSession> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(AppError::ExternalService(format!(
                "stripe {operation} failed with status {status}: {message}"
            )));
        }

        let session = response
            .json::<StripeCheckoutSession>()
            .await
            .map_err(|error| {
                AppError::ExternalService(format!(
                    "stripe {operation} returned an unreadable body: {error}"
                ))
            })?;

        Ok(session.into())
    }
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    payment_status: String,
    #[serde(default)]
    metadata: StripeSessionMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct StripeSessionMetadata {
    order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

impl From<StripeCheckoutSession> for CheckoutSession {
    fn from(session: StripeCheckoutSession) -> Self {
        Self {
            id: session.id,
            url: session.url,
            payment_status: session.payment_status,
            order_id: session
                .metadata
                .order_id
                .as_deref()
                .and_then(|value| Uuid::parse_str(value).ok()),
        }
    }
}

fn checkout_form(request: &CheckoutSessionRequest) -> String {
    let amount = request.amount_minor.to_string();
    let currency = request.currency.as_str().to_ascii_lowercase();
    let order_id = request.order_id.to_string();

    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("mode", "payment")
        .append_pair("line_items[0][quantity]", "1")
        .append_pair("line_items[0][price_data][currency]", &currency)
        .append_pair("line_items[0][price_data][unit_amount]", &amount)
        .append_pair(
            "line_items[0][price_data][product_data][name]",
            &request.description,
        )
        .append_pair("customer_email", &request.customer_email)
        .append_pair("success_url", &request.success_url)
        .append_pair("cancel_url", &request.cancel_url)
        .append_pair("metadata[order_id]", &order_id)
        .finish()
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        let response = self
            .http_client
            .post(self.endpoint(&["v1", "checkout", "sessions"])?)
            .bearer_auth(&self.secret_key)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(checkout_form(request))
            .send()
            .await
            .map_err(|error| {
                AppError::ExternalService(format!("stripe checkout request failed: {error}"))
            })?;

        self.read_session(response, "checkout session creation").await
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession> {
        let response = self
            .http_client
            .get(self.endpoint(&["v1", "checkout", "sessions", session_id])?)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|error| {
                AppError::ExternalService(format!("stripe session lookup failed: {error}"))
            })?;

        self.read_session(response, "checkout session lookup").await
    }
}

#[cfg(test)]
mod tests;
