mod audit;
mod common;
mod payments;
mod roles;

pub use audit::AuditLogPageResponse;
pub use common::{HealthResponse, UserIdentityResponse};
pub use payments::{
    FinalizeStripeSessionRequest, InitiatePaymentRequest, OrderResponse, PaymentResponse,
};
pub use roles::{RoleElevationResponse, UserRoleRequest, UserRolesResponse};
