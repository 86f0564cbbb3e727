//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `payment` - Orders, order codes, payment sessions and notifications
//! - `entitlement` - Time-bounded grants that let a customer skip payment

pub mod entitlement;
pub mod foundation;
pub mod payment;
