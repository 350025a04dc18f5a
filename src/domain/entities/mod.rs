//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod exchange;
pub mod status;
pub mod timestamp;

pub use command::{CommandEntry, CommandTable};
pub use exchange::Exchange;
pub use status::StatusRecord;
