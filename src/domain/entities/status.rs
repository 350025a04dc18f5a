use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

use super::timestamp;

/// A delivery-status callback from the carrier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(alias = "message_sid")]
    pub message_id: String,
    pub status: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub error_code: Option<String>,
    #[serde(alias = "to")]
    pub recipient: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Local>,
}

impl StatusRecord {
    pub fn new(
        message_id: impl Into<String>,
        status: impl Into<String>,
        error_code: Option<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            status: status.into(),
            error_code: error_code.filter(|c| !c.trim().is_empty()),
            recipient: recipient.into(),
            timestamp: timestamp::now(),
        }
    }

    /// `failed` and `undelivered` mean the carrier gave up on the message
    pub fn is_failure(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "failed" | "undelivered"
        )
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let code = Option::<String>::deserialize(deserializer)?;
    Ok(code.filter(|c| !c.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_statuses() {
        for status in ["failed", "undelivered", "FAILED"] {
            assert!(StatusRecord::new("SM1", status, None, "+1").is_failure());
        }
        for status in ["queued", "sent", "delivered", "read"] {
            assert!(!StatusRecord::new("SM1", status, None, "+1").is_failure());
        }
    }

    #[test]
    fn test_blank_error_code_dropped() {
        let record = StatusRecord::new("SM1", "sent", Some(String::new()), "+1");
        assert_eq!(record.error_code, None);
    }

    #[test]
    fn test_reads_legacy_field_names() {
        let raw = r#"{"message_sid":"SM42","status":"undelivered","error_code":"","to":"whatsapp:+15550001111","timestamp":"2024-01-09T08:15:00.000001"}"#;
        let record: StatusRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.message_id, "SM42");
        assert_eq!(record.recipient, "whatsapp:+15550001111");
        assert_eq!(record.error_code, None);
        assert!(record.is_failure());
    }

    #[test]
    fn test_writes_current_field_names() {
        let record = StatusRecord::new("SM7", "failed", Some("63016".into()), "+1");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["message_id"], "SM7");
        assert_eq!(value["recipient"], "+1");
        assert_eq!(value["error_code"], "63016");
    }
}
