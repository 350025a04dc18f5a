//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (CommandTable, Exchange, StatusRecord)
//! - Traits: Abstractions for infrastructure (Carrier, RecordSink)

pub mod entities;
pub mod traits;
