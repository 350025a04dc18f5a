//! Platform adapters: Twilio carrier, HTTP endpoints, local console

pub mod console;
pub mod http;
pub mod twilio;
