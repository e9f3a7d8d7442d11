use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, State};
use storefront_application::InitiatePaymentInput;
use storefront_core::{AppError, UserIdentity};
use storefront_domain::PaymentMethod;
use uuid::Uuid;

use crate::dto::{
    FinalizeStripeSessionRequest, InitiatePaymentRequest, OrderResponse, PaymentResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn initiate_payment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<InitiatePaymentRequest>,
) -> ApiResult<Json<PaymentResponse>> {
    let input = payment_input(payload)?;
    let initiation = state.payment_service.initiate_payment(&user, input).await?;

    Ok(Json(PaymentResponse::from(initiation)))
}

pub async fn finalize_stripe_session_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<FinalizeStripeSessionRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state
        .payment_service
        .finalize_hosted_session(&user, &payload.session_id)
        .await?;

    Ok(Json(OrderResponse::from(order)))
}

fn payment_input(payload: InitiatePaymentRequest) -> Result<InitiatePaymentInput, AppError> {
    let order_id = Uuid::parse_str(payload.order_id.trim())
        .map_err(|error| AppError::Validation(format!("invalid order id: {error}")))?;

    Ok(InitiatePaymentInput {
        order_id,
        method: PaymentMethod::from_str(&payload.method)?,
        amount_minor: payload.amount,
        currency: payload.currency,
    })
}
