//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod follow_up;
mod pagination;
mod payment;
mod user;

pub use audit::{AuditAction, AuditEntry, AuditLogFilter, NewAuditEntry};
pub use follow_up::{
    FOLLOW_UP_MAX_ATTEMPTS, FollowUpFailure, FollowUpJob, FollowUpStatus, FollowUpTask,
    follow_up_retry_delay_seconds,
};
pub use pagination::{MAX_PAGE_SIZE, Page, PageRequest};
pub use payment::{
    CurrencyCode, Money, Order, OrderStatus, Payment, PaymentMethod, PaymentStatus,
};
pub use user::{EmailAddress, RoleType, UserId};
