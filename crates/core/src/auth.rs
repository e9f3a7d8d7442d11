use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account information persisted in the authenticated session.
///
/// Roles are not cached here; authorization checks read the
/// current role set from the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    account_id: Uuid,
    display_name: String,
    email: String,
}

impl UserIdentity {
    /// Creates a user identity from an authenticated account.
    #[must_use]
    pub fn new(
        account_id: Uuid,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the registered contact email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}
