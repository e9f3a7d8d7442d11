use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use storefront_core::{AppError, AppResult, UserIdentity};
use storefront_domain::{
    AuditEntry, CurrencyCode, NewAuditEntry, Order, OrderStatus, Payment, PaymentMethod,
    PaymentStatus,
};

use crate::{
    CheckoutSession, CheckoutSessionRequest, OrderRepository, PaymentGateway, PaymentRepository,
};

use super::{CheckoutRedirectUrls, InitiatePaymentInput, PaymentService};

#[derive(Default)]
struct FakeGateway {
    created: Mutex<Vec<CheckoutSessionRequest>>,
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    unavailable: bool,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        if self.unavailable {
            return Err(AppError::ExternalService("gateway returned 503".to_owned()));
        }

        let session = CheckoutSession {
            id: format!("cs_test_{}", self.created.lock().await.len()),
            url: Some("https://checkout.stripe.test/pay".to_owned()),
            payment_status: "unpaid".to_owned(),
            order_id: Some(request.order_id),
        };
        self.created.lock().await.push(request.clone());
        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::ExternalService(format!("no such session {session_id}")))
    }
}

#[derive(Default)]
struct FakeLedger {
    orders: Mutex<HashMap<Uuid, Order>>,
    payments: Mutex<Vec<Payment>>,
    audit_entries: Mutex<Vec<AuditEntry>>,
}

#[async_trait]
impl OrderRepository for FakeLedger {
    async fn find_by_id(&self, order_id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.orders.lock().await.get(&order_id).cloned())
    }
}

#[async_trait]
impl PaymentRepository for FakeLedger {
    async fn record_pending(
        &self,
        payment: Payment,
        audit_entry: NewAuditEntry,
    ) -> AppResult<Payment> {
        self.payments.lock().await.push(payment.clone());
        let mut audit_entries = self.audit_entries.lock().await;
        let id = audit_entries.len() as i64 + 1;
        audit_entries.push(audit_entry.into_entry(id, chrono::Utc::now()));
        Ok(payment)
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> AppResult<Option<Payment>> {
        Ok(self
            .payments
            .lock()
            .await
            .iter()
            .find(|payment| payment.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn complete(
        &self,
        payment_id: Uuid,
        order_id: Uuid,
        audit_entry: NewAuditEntry,
    ) -> AppResult<Order> {
        for payment in self.payments.lock().await.iter_mut() {
            if payment.id == payment_id {
                payment.status = PaymentStatus::Completed;
            }
        }
        let mut orders = self.orders.lock().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound("order".to_owned()))?;
        order.status = OrderStatus::Paid;

        let mut audit_entries = self.audit_entries.lock().await;
        let id = audit_entries.len() as i64 + 1;
        audit_entries.push(audit_entry.into_entry(id, chrono::Utc::now()));
        Ok(order.clone())
    }
}

struct Fixture {
    gateway: Arc<FakeGateway>,
    ledger: Arc<FakeLedger>,
    service: PaymentService,
    buyer: UserIdentity,
    order_id: Uuid,
}

async fn fixture(gateway: FakeGateway) -> Fixture {
    let gateway = Arc::new(gateway);
    let ledger = Arc::new(FakeLedger::default());
    let buyer = UserIdentity::new(Uuid::new_v4(), "Buyer", "buyer@example.com");
    let order = Order {
        id: Uuid::new_v4(),
        buyer_account_id: buyer.account_id(),
        buyer_email: "buyer@example.com".to_owned(),
        total_minor: 12_550,
        currency: CurrencyCode::new("EUR").unwrap_or_else(|_| panic!("test")),
        status: OrderStatus::PendingPayment,
    };
    let order_id = order.id;
    ledger.orders.lock().await.insert(order.id, order);

    let service = PaymentService::new(
        gateway.clone(),
        ledger.clone(),
        ledger.clone(),
        CheckoutRedirectUrls {
            success_url: "https://shop.test/payment/success".to_owned(),
            cancel_url: "https://shop.test/payment/cancel?reason=user".to_owned(),
        },
    );

    Fixture {
        gateway,
        ledger,
        service,
        buyer,
        order_id,
    }
}

fn input(order_id: Uuid, method: PaymentMethod) -> InitiatePaymentInput {
    InitiatePaymentInput {
        order_id,
        method,
        amount_minor: 12_550,
        currency: "eur".to_owned(),
    }
}

#[tokio::test]
async fn stripe_payment_opens_checkout_session() {
    let fixture = fixture(FakeGateway::default()).await;

    let initiation = fixture
        .service
        .initiate_payment(&fixture.buyer, input(fixture.order_id, PaymentMethod::Stripe))
        .await
        .unwrap_or_else(|_| panic!("test"));

    assert_eq!(
        initiation.redirect_url.as_deref(),
        Some("https://checkout.stripe.test/pay")
    );
    assert_eq!(initiation.payment.status, PaymentStatus::Pending);
    assert_eq!(initiation.payment.transaction_id.as_deref(), Some("cs_test_0"));

    let created = fixture.gateway.created.lock().await;
    assert_eq!(
        created[0].success_url,
        "https://shop.test/payment/success?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(
        created[0].cancel_url,
        "https://shop.test/payment/cancel?reason=user&session_id={CHECKOUT_SESSION_ID}"
    );

    let audit_entries = fixture.ledger.audit_entries.lock().await;
    assert_eq!(audit_entries[0].action, "PAYMENT_INITIATED");
}

#[tokio::test]
async fn bank_transfer_gets_reference_without_redirect() {
    let fixture = fixture(FakeGateway::default()).await;

    let initiation = fixture
        .service
        .initiate_payment(
            &fixture.buyer,
            input(fixture.order_id, PaymentMethod::BankTransfer),
        )
        .await
        .unwrap_or_else(|_| panic!("test"));

    assert!(initiation.redirect_url.is_none());
    let reference = initiation.payment.transaction_id.unwrap_or_default();
    assert!(Uuid::parse_str(&reference).is_ok());
    assert!(fixture.gateway.created.lock().await.is_empty());
}

#[tokio::test]
async fn payment_for_foreign_order_is_forbidden() {
    let fixture = fixture(FakeGateway::default()).await;
    let stranger = UserIdentity::new(Uuid::new_v4(), "Other", "other@example.com");

    let result = fixture
        .service
        .initiate_payment(&stranger, input(fixture.order_id, PaymentMethod::Stripe))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let fixture = fixture(FakeGateway::default()).await;

    let result = fixture
        .service
        .initiate_payment(&fixture.buyer, input(Uuid::new_v4(), PaymentMethod::Stripe))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn mismatched_amount_is_rejected_before_gateway_call() {
    let fixture = fixture(FakeGateway::default()).await;
    let mut request = input(fixture.order_id, PaymentMethod::Stripe);
    request.amount_minor = 100;

    let result = fixture.service.initiate_payment(&fixture.buyer, request).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(fixture.gateway.created.lock().await.is_empty());
    assert!(fixture.ledger.payments.lock().await.is_empty());
}

#[tokio::test]
async fn gateway_failure_surfaces_as_external_service_error() {
    let fixture = fixture(FakeGateway {
        unavailable: true,
        ..FakeGateway::default()
    })
    .await;

    let result = fixture
        .service
        .initiate_payment(&fixture.buyer, input(fixture.order_id, PaymentMethod::Stripe))
        .await;
    assert!(matches!(result, Err(AppError::ExternalService(_))));
    assert!(fixture.ledger.payments.lock().await.is_empty());
}

#[tokio::test]
async fn unpaid_session_is_not_finalized() {
    let fixture = fixture(FakeGateway::default()).await;
    fixture
        .service
        .initiate_payment(&fixture.buyer, input(fixture.order_id, PaymentMethod::Stripe))
        .await
        .unwrap_or_else(|_| panic!("test"));

    let result = fixture
        .service
        .finalize_hosted_session(&fixture.buyer, "cs_test_0")
        .await;
    match result {
        Err(AppError::Validation(message)) => assert_eq!(message, "payment not completed"),
        other => panic!("unexpected result: {other:?}"),
    }

    let orders = fixture.ledger.orders.lock().await;
    assert_eq!(
        orders.get(&fixture.order_id).map(|order| order.status),
        Some(OrderStatus::PendingPayment)
    );
}

#[tokio::test]
async fn paid_session_marks_order_paid_once() {
    let fixture = fixture(FakeGateway::default()).await;
    fixture
        .service
        .initiate_payment(&fixture.buyer, input(fixture.order_id, PaymentMethod::Stripe))
        .await
        .unwrap_or_else(|_| panic!("test"));
    if let Some(session) = fixture.gateway.sessions.lock().await.get_mut("cs_test_0") {
        session.payment_status = "PAID".to_owned();
    }

    let order = fixture
        .service
        .finalize_hosted_session(&fixture.buyer, "cs_test_0")
        .await
        .unwrap_or_else(|_| panic!("test"));
    assert_eq!(order.status, OrderStatus::Paid);

    let again = fixture
        .service
        .finalize_hosted_session(&fixture.buyer, "cs_test_0")
        .await
        .unwrap_or_else(|_| panic!("test"));
    assert_eq!(again.status, OrderStatus::Paid);

    let actions: Vec<String> = fixture
        .ledger
        .audit_entries
        .lock()
        .await
        .iter()
        .map(|entry| entry.action.clone())
        .collect();
    assert_eq!(actions, vec!["PAYMENT_INITIATED", "PAYMENT_FINALIZED"]);
    assert_eq!(
        fixture.ledger.payments.lock().await[0].status,
        PaymentStatus::Completed
    );
}
