use axum::Json;
use axum::extract::{Extension, Query, State};
use serde::Deserialize;
use storefront_application::RoleElevation;
use storefront_core::UserIdentity;
use storefront_domain::RoleType;

use crate::dto::{RoleElevationResponse, UserRoleRequest, UserRolesResponse};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserRolesQuery {
    pub email: String,
}

pub async fn assign_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<UserRoleRequest>,
) -> ApiResult<Json<UserRolesResponse>> {
    let account = state
        .role_service
        .assign_role(&user, &payload.email, &payload.role)
        .await?;

    Ok(Json(UserRolesResponse {
        email: account.email.as_str().to_owned(),
        roles: role_names(account.roles.iter().copied()),
    }))
}

pub async fn remove_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<UserRoleRequest>,
) -> ApiResult<Json<UserRolesResponse>> {
    let account = state
        .role_service
        .remove_role(&user, &payload.email, &payload.role)
        .await?;

    Ok(Json(UserRolesResponse {
        email: account.email.as_str().to_owned(),
        roles: role_names(account.roles.iter().copied()),
    }))
}

pub async fn list_user_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<UserRolesQuery>,
) -> ApiResult<Json<UserRolesResponse>> {
    let roles = state.role_service.roles_of(&user, &query.email).await?;

    Ok(Json(UserRolesResponse {
        email: query.email.trim().to_lowercase(),
        roles: role_names(roles),
    }))
}

pub async fn become_seller_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<RoleElevationResponse>> {
    let elevation = state.role_service.become_individual_seller(&user).await?;

    Ok(Json(elevation_response(elevation)))
}

fn elevation_response(elevation: RoleElevation) -> RoleElevationResponse {
    let role = RoleType::Seller.as_str().to_owned();
    match elevation {
        RoleElevation::Elevated => RoleElevationResponse {
            message: "You are now an individual seller.".to_owned(),
            role,
            elevated: true,
        },
        RoleElevation::AlreadyHeld => RoleElevationResponse {
            message: "You are already an individual seller.".to_owned(),
            role,
            elevated: false,
        },
    }
}

fn role_names(roles: impl IntoIterator<Item = RoleType>) -> Vec<String> {
    roles
        .into_iter()
        .map(|role| role.as_str().to_owned())
        .collect()
}
