use serde::Serialize;
use storefront_application::AccountRecord;
use storefront_core::UserIdentity;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of the authenticated account.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub account_id: String,
    pub display_name: String,
    pub email: String,
    /// Roles held right now, e.g. `["BUYER", "SELLER"]`.
    pub roles: Vec<String>,
}

impl UserIdentityResponse {
    /// Combines the session identity with the account's current roles.
    #[must_use]
    pub fn from_account(identity: &UserIdentity, account: &AccountRecord) -> Self {
        Self {
            account_id: identity.account_id().to_string(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().to_owned(),
            roles: account
                .roles
                .iter()
                .map(|role| role.as_str().to_owned())
                .collect(),
        }
    }
}
