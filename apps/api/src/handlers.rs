pub mod audit;
pub mod health;
pub mod payments;
pub mod roles;
