//! Domain traits - Abstractions for infrastructure implementations

pub mod carrier;
pub mod sink;

pub use carrier::{Carrier, CarrierInfo, SentMessage};
pub use sink::{BestEffort, RecordSink};
