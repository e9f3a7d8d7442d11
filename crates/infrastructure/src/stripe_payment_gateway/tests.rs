use serde_json::json;
use storefront_application::{CheckoutSessionRequest, PaymentGateway};
use storefront_core::AppError;
use storefront_domain::CurrencyCode;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{StripeGatewayConfig, StripePaymentGateway};

fn gateway(server: &MockServer) -> StripePaymentGateway {
    StripePaymentGateway::new(
        reqwest::Client::new(),
        StripeGatewayConfig {
            secret_key: "sk_test_123".to_owned(),
            api_base_url: server.uri(),
        },
    )
    .unwrap_or_else(|_| panic!("test"))
}

fn checkout_request(order_id: Uuid) -> CheckoutSessionRequest {
    CheckoutSessionRequest {
        order_id,
        amount_minor: 4_999,
        currency: CurrencyCode::new("EUR").unwrap_or_else(|_| panic!("test")),
        customer_email: "buyer@example.com".to_owned(),
        description: format!("Order {order_id}"),
        success_url: "https://shop.example.com/success?session_id={CHECKOUT_SESSION_ID}"
            .to_owned(),
        cancel_url: "https://shop.example.com/cancel".to_owned(),
    }
}

#[tokio::test]
async fn creates_session_with_form_encoded_line_item() {
    let server = MockServer::start().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("authorization", "Bearer sk_test_123"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("mode=payment"))
        .and(body_string_contains("currency%5D=eur"))
        .and(body_string_contains("unit_amount%5D=4999"))
        .and(body_string_contains(format!("order_id%5D={order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_abc",
            "url": "https://checkout.stripe.com/c/pay/cs_test_abc",
            "payment_status": "unpaid",
            "metadata": { "order_id": order_id.to_string() }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = gateway(&server)
        .create_checkout_session(&checkout_request(order_id))
        .await
        .unwrap_or_else(|_| panic!("test"));

    assert_eq!(session.id, "cs_test_abc");
    assert_eq!(
        session.url.as_deref(),
        Some("https://checkout.stripe.com/c/pay/cs_test_abc")
    );
    assert_eq!(session.order_id, Some(order_id));
    assert!(!session.is_paid());
}

#[tokio::test]
async fn retrieves_paid_session_without_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_paid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_paid",
            "url": null,
            "payment_status": "paid"
        })))
        .mount(&server)
        .await;

    let session = gateway(&server)
        .retrieve_checkout_session("cs_test_paid")
        .await
        .unwrap_or_else(|_| panic!("test"));

    assert!(session.is_paid());
    assert_eq!(session.order_id, None);
}

#[tokio::test]
async fn stripe_error_becomes_external_service_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "No such checkout.session: 'cs_missing'" }
        })))
        .mount(&server)
        .await;

    let result = gateway(&server).retrieve_checkout_session("cs_missing").await;

    match result {
        Err(AppError::ExternalService(message)) => {
            assert!(message.contains("No such checkout.session"));
            assert!(message.contains("404"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn session_id_is_escaped_into_a_single_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/a%2Fb"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "No such checkout.session" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway(&server).retrieve_checkout_session("a/b").await;

    assert!(matches!(result, Err(AppError::ExternalService(_))));
}

#[test]
fn blank_secret_key_is_rejected() {
    let result = StripePaymentGateway::new(
        reqwest::Client::new(),
        StripeGatewayConfig {
            secret_key: "  ".to_owned(),
            api_base_url: "https://api.stripe.com".to_owned(),
        },
    );

    assert!(matches!(result, Err(AppError::Validation(_))));
}
