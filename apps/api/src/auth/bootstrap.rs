use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use storefront_core::{AppError, UserIdentity};
use storefront_domain::EmailAddress;
use tower_sessions::Session;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub email: String,
    pub token: String,
}

/// Signs an account in with the shared bootstrap token, registering it as a
/// buyer on first use.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let email = EmailAddress::new(payload.email)?;
    let account = state
        .account_repository
        .ensure_account(&email, default_display_name(email.as_str()))
        .await?;

    let identity = UserIdentity::new(
        account.id.as_uuid(),
        account.display_name.as_str(),
        account.email.as_str(),
    );

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(account_id = %account.id, "bootstrap sign-in");
    Ok(StatusCode::NO_CONTENT)
}

fn default_display_name(email: &str) -> &str {
    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or("new user")
}

#[cfg(test)]
mod tests {
    use super::default_display_name;

    #[test]
    fn display_name_defaults_to_local_part() {
        assert_eq!(default_display_name("jane.doe@example.com"), "jane.doe");
    }
}
