mod cors;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use storefront_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

use self::cors::build_cors_layer;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let admin_routes = Router::new()
        .route(
            "/api/admin/audit-logs",
            get(handlers::audit::list_audit_logs_handler),
        )
        .route(
            "/api/admin/user-roles",
            get(handlers::roles::list_user_roles_handler),
        )
        .route(
            "/api/admin/user-roles/assign",
            post(handlers::roles::assign_user_role_handler),
        )
        .route(
            "/api/admin/user-roles/remove",
            post(handlers::roles::remove_user_role_handler),
        );

    let buyer_routes = Router::new()
        .route(
            "/api/buyer/roles/become-seller",
            post(handlers::roles::become_seller_handler),
        )
        .route(
            "/api/buyer/payments",
            post(handlers::payments::initiate_payment_handler),
        )
        .route(
            "/api/buyer/payments/stripe/finalize",
            post(handlers::payments::finalize_stripe_session_handler),
        );

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .merge(admin_routes)
        .merge(buyer_routes)
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
