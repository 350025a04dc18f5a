use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Incoming text recorded for messages the service sends on its own
pub const SYSTEM_SENT: &str = "SYSTEM_SENT";

/// Which way an exchange travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

/// One logged message interaction. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub sender: String,
    pub incoming: String,
    pub response: String,
    pub direction: Direction,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Local>,
}

impl Exchange {
    /// A carrier-delivered message and the reply the service produced for it
    pub fn incoming(
        sender: impl Into<String>,
        incoming: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            incoming: incoming.into(),
            response: response.into(),
            direction: Direction::Incoming,
            timestamp: timestamp::now(),
        }
    }

    /// A message the service pushed to `recipient` through the carrier
    pub fn outgoing(recipient: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: recipient.into(),
            incoming: SYSTEM_SENT.to_string(),
            response: text.into(),
            direction: Direction::Outgoing,
            timestamp: timestamp::now(),
        }
    }

    /// First 50 characters of the incoming text, for log lines
    pub fn preview(&self) -> String {
        self.incoming.chars().take(50).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let exchange = Exchange::incoming("whatsapp:+966500000000", "hello", "hi");
        let value = serde_json::to_value(&exchange).unwrap();
        assert_eq!(value["sender"], "whatsapp:+966500000000");
        assert_eq!(value["direction"], "incoming");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_outgoing_marks_system_sent() {
        let exchange = Exchange::outgoing("whatsapp:+15550001111", "Your order shipped");
        assert_eq!(exchange.incoming, SYSTEM_SENT);
        assert_eq!(exchange.direction, Direction::Outgoing);
        assert_eq!(exchange.response, "Your order shipped");
    }

    #[test]
    fn test_reads_legacy_record() {
        let raw = r#"{"sender":"whatsapp:+1","incoming":"hi","response":"x","direction":"outgoing","timestamp":"2024-03-02T10:00:00.5"}"#;
        let exchange: Exchange = serde_json::from_str(raw).unwrap();
        assert_eq!(exchange.direction, Direction::Outgoing);
    }

    #[test]
    fn test_preview_is_char_bounded() {
        let exchange = Exchange::incoming("s", "م".repeat(80), "r");
        assert_eq!(exchange.preview().chars().count(), 50);
    }
}
