//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Classification and request orchestration
//! - Errors: Domain-specific errors
//! - Messaging: Boundary parsing, sender access policy

pub mod errors;
pub mod services;
pub mod messaging;
