//! Message handling - Boundary parsing and sender access control

pub mod access;
pub mod parser;

pub use access::{AllowAll, Allowlist, SenderPolicy};
pub use parser::MessageParser;
