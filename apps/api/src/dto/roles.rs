use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for administrative role changes.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-role-request.ts"
)]
pub struct UserRoleRequest {
    pub email: String,
    pub role: String,
}

/// Roles currently held by an account.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-roles-response.ts"
)]
pub struct UserRolesResponse {
    pub email: String,
    pub roles: Vec<String>,
}

/// Outcome of a self-service elevation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-elevation-response.ts"
)]
pub struct RoleElevationResponse {
    pub role: String,
    /// `true` when this request granted the role.
    pub elevated: bool,
    pub message: String,
}
