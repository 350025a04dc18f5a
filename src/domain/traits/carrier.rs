use async_trait::async_trait;
use crate::application::errors::CarrierError;

/// Carrier trait - abstraction for the messaging transport that places
/// outbound messages
#[async_trait]
pub trait Carrier: Send + Sync {
    /// Send `body` to a carrier-addressed recipient (e.g. `whatsapp:+15550001111`)
    async fn send_message(&self, to: &str, body: &str) -> Result<SentMessage, CarrierError>;

    /// Get carrier info
    fn carrier_info(&self) -> CarrierInfo;
}

/// Carrier acknowledgement of an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub sid: String,
    pub status: String,
}

/// Carrier information
#[derive(Debug, Clone)]
pub struct CarrierInfo {
    pub name: String,
    /// Carrier-addressed sender used for outbound messages
    pub from: String,
    /// Whether credentials for a real transport are present
    pub configured: bool,
}
