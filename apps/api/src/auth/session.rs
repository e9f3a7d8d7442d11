use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use storefront_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the signed-in identity with its current roles.
pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let account = state.authorization_service.current_account(&identity).await?;

    Ok(Json(UserIdentityResponse::from_account(&identity, &account)))
}
