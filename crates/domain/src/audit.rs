//! Audit trail entries and the filter predicate used to query them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{AppError, AppResult, NonEmptyString};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// An account promoted itself to individual seller.
    BecomeIndividualSeller,
    /// An administrator granted a role to an account.
    AssignRole,
    /// An administrator removed a role from an account.
    RemoveRole,
    /// A buyer started paying for an order.
    PaymentInitiated,
    /// A hosted checkout session was confirmed as paid.
    PaymentFinalized,
}

impl AuditAction {
    /// Returns the stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BecomeIndividualSeller => "BECOME_INDIVIDUAL_SELLER",
            Self::AssignRole => "ASSIGN_ROLE",
            Self::RemoveRole => "REMOVE_ROLE",
            Self::PaymentInitiated => "PAYMENT_INITIATED",
            Self::PaymentFinalized => "PAYMENT_FINALIZED",
        }
    }
}

/// Persisted, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Monotonic storage identifier.
    pub id: i64,
    /// Account the action concerns.
    pub subject_email: String,
    /// Symbolic action code.
    pub action: String,
    /// Actor, when different from or in addition to the subject.
    pub performed_by: Option<String>,
    /// Role concerned by role-related actions.
    pub role_name: Option<String>,
    /// Free-text description.
    pub details: String,
    /// Server-assigned creation time.
    pub timestamp: DateTime<Utc>,
}

/// Audit entry awaiting persistence.
///
/// Fields are stored verbatim; the only rule is a non-blank action code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    subject_email: String,
    action: NonEmptyString,
    performed_by: Option<String>,
    role_name: Option<String>,
    details: String,
}

impl NewAuditEntry {
    /// Creates an entry for the given subject and action.
    pub fn new(
        subject_email: impl Into<String>,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> AppResult<Self> {
        let action = NonEmptyString::new(action)
            .map_err(|_| AppError::Validation("audit action must not be empty".to_owned()))?;

        Ok(Self {
            subject_email: subject_email.into(),
            action,
            performed_by: None,
            role_name: None,
            details: details.into(),
        })
    }

    /// Sets the acting account.
    #[must_use]
    pub fn with_performed_by(mut self, performed_by: Option<String>) -> Self {
        self.performed_by = performed_by;
        self
    }

    /// Sets the role concerned by the action.
    #[must_use]
    pub fn with_role_name(mut self, role_name: Option<String>) -> Self {
        self.role_name = role_name;
        self
    }

    /// Returns the subject email.
    #[must_use]
    pub fn subject_email(&self) -> &str {
        self.subject_email.as_str()
    }

    /// Returns the action code.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the acting account, if recorded.
    #[must_use]
    pub fn performed_by(&self) -> Option<&str> {
        self.performed_by.as_deref()
    }

    /// Returns the concerned role, if recorded.
    #[must_use]
    pub fn role_name(&self) -> Option<&str> {
        self.role_name.as_deref()
    }

    /// Returns the free-text details.
    #[must_use]
    pub fn details(&self) -> &str {
        self.details.as_str()
    }

    /// Materializes the stored form with an assigned identifier and time.
    #[must_use]
    pub fn into_entry(self, id: i64, timestamp: DateTime<Utc>) -> AuditEntry {
        AuditEntry {
            id,
            subject_email: self.subject_email,
            action: self.action.into(),
            performed_by: self.performed_by,
            role_name: self.role_name,
            details: self.details,
            timestamp,
        }
    }
}

/// Conjunctive audit query filter. Unset fields match every entry.
///
/// String fields match exactly. The time window is inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilter {
    /// Exact subject email.
    pub subject_email: Option<String>,
    /// Exact role name.
    pub role_name: Option<String>,
    /// Exact action code.
    pub action: Option<String>,
    /// Exact details text.
    pub details: Option<String>,
    /// Exact actor.
    pub performed_by: Option<String>,
    /// Earliest timestamp, inclusive.
    pub start_time: Option<DateTime<Utc>>,
    /// Latest timestamp, inclusive.
    pub end_time: Option<DateTime<Utc>>,
}

impl AuditLogFilter {
    /// Rejects an inverted time window.
    pub fn validate(&self) -> AppResult<()> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(AppError::Validation(
                    "start time must not be after end time".to_owned(),
                ));
            }
        }

        Ok(())
    }

    /// Returns whether an entry satisfies every supplied predicate.
    #[must_use]
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        matches_required(self.subject_email.as_deref(), entry.subject_email.as_str())
            && matches_optional(self.role_name.as_deref(), entry.role_name.as_deref())
            && matches_required(self.action.as_deref(), entry.action.as_str())
            && matches_required(self.details.as_deref(), entry.details.as_str())
            && matches_optional(self.performed_by.as_deref(), entry.performed_by.as_deref())
            && self.start_time.is_none_or(|start| entry.timestamp >= start)
            && self.end_time.is_none_or(|end| entry.timestamp <= end)
    }
}

fn matches_required(filter: Option<&str>, value: &str) -> bool {
    filter.is_none_or(|expected| expected == value)
}

// A NULL column never equals a supplied filter, not even an empty one.
fn matches_optional(filter: Option<&str>, value: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(expected) => value == Some(expected),
    }
}
