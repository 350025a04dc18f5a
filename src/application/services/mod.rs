//! Application services - Business logic orchestration

pub mod classifier;
pub mod message_service;


pub use classifier::{Classifier, MatchStrategy};
pub use message_service::{InboundOutcome, MessageService};
