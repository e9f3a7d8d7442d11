use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use storefront_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the session identity and exposes it as a request extension.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Rejects state-changing requests that do not originate from the frontend.
pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        check_request_origin(request.headers(), &state.frontend_url)?;
    }

    Ok(next.run(request).await)
}

fn check_request_origin(headers: &HeaderMap, frontend_url: &str) -> Result<(), AppError> {
    if headers
        .get("sec-fetch-site")
        .is_some_and(|fetch_site| fetch_site == "cross-site")
    {
        return Err(AppError::Unauthorized("cross-site request blocked".to_owned()));
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let allowed_origin = frontend_url.trim_end_matches('/');
    let origin_is_allowed = origin == allowed_origin;
    let referer_is_allowed = referer == allowed_origin
        || referer
            .strip_prefix(allowed_origin)
            .is_some_and(|rest| rest.starts_with('/'));

    if !origin_is_allowed && !referer_is_allowed {
        return Err(AppError::Unauthorized("origin validation failed".to_owned()));
    }

    Ok(())
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
