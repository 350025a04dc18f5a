//! Message parser - Turns raw carrier fields into validated requests

use crate::application::errors::ValidationError;
use crate::domain::entities::StatusRecord;

/// A carrier-delivered message that passed boundary checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    /// Trimmed, never empty
    pub body: String,
}

/// A validated request to push a message through the carrier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// E.164 number with leading `+`
    pub to: String,
    pub message: String,
}

/// Parses raw carrier fields into structured requests
pub struct MessageParser {
    address_prefix: String,
}

impl MessageParser {
    pub fn new(address_prefix: impl Into<String>) -> Self {
        Self {
            address_prefix: address_prefix.into(),
        }
    }

    /// Parse an inbound webhook delivery. Blank bodies are rejected before
    /// they reach the classifier.
    pub fn parse_inbound(&self, sender: &str, body: &str) -> Result<InboundMessage, ValidationError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(InboundMessage {
            sender: sender.trim().to_string(),
            body: body.to_string(),
        })
    }

    /// Parse an outbound send request
    pub fn parse_outbound(
        &self,
        to: Option<&str>,
        message: Option<&str>,
    ) -> Result<OutboundRequest, ValidationError> {
        let to = to
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingField("to"))?;
        let message = message
            .filter(|s| !s.trim().is_empty())
            .ok_or(ValidationError::MissingField("message"))?;

        if !to.starts_with('+') {
            return Err(ValidationError::InvalidPhone(to.to_string()));
        }

        Ok(OutboundRequest {
            to: to.to_string(),
            message: message.to_string(),
        })
    }

    /// Parse a delivery-status callback. The carrier never withholds these,
    /// so missing fields are kept as empty strings.
    pub fn parse_status(
        &self,
        message_id: &str,
        status: &str,
        error_code: Option<&str>,
        recipient: &str,
    ) -> StatusRecord {
        StatusRecord::new(
            message_id.trim(),
            status.trim(),
            error_code.map(|c| c.trim().to_string()),
            recipient.trim(),
        )
    }

    /// Carrier address for an E.164 number (`+1555…` -> `whatsapp:+1555…`)
    pub fn address(&self, number: &str) -> String {
        if number.starts_with(&self.address_prefix) {
            number.to_string()
        } else {
            format!("{}{}", self.address_prefix, number)
        }
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new("whatsapp:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_trims_body() {
        let parser = MessageParser::default();
        let msg = parser.parse_inbound("whatsapp:+1", "  hello \n").unwrap();
        assert_eq!(msg.body, "hello");
        assert_eq!(msg.sender, "whatsapp:+1");
    }

    #[test]
    fn test_inbound_blank_body_rejected() {
        let parser = MessageParser::default();
        for body in ["", "   ", "\n\t"] {
            assert_eq!(
                parser.parse_inbound("whatsapp:+1", body),
                Err(ValidationError::EmptyBody)
            );
        }
    }

    #[test]
    fn test_outbound_requires_plus() {
        let parser = MessageParser::default();
        let err = parser
            .parse_outbound(Some("966500000000"), Some("مرحباً"))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidPhone("966500000000".into()));
    }

    #[test]
    fn test_outbound_missing_fields() {
        let parser = MessageParser::default();
        assert_eq!(
            parser.parse_outbound(None, Some("x")),
            Err(ValidationError::MissingField("to"))
        );
        assert_eq!(
            parser.parse_outbound(Some("+1"), Some("  ")),
            Err(ValidationError::MissingField("message"))
        );
    }

    #[test]
    fn test_outbound_ok() {
        let parser = MessageParser::default();
        let req = parser
            .parse_outbound(Some(" +966500000000 "), Some("مرحباً"))
            .unwrap();
        assert_eq!(req.to, "+966500000000");
        assert_eq!(req.message, "مرحباً");
    }

    #[test]
    fn test_address() {
        let parser = MessageParser::default();
        assert_eq!(parser.address("+15550001111"), "whatsapp:+15550001111");
        assert_eq!(parser.address("whatsapp:+15550001111"), "whatsapp:+15550001111");
    }

    #[test]
    fn test_status_blank_error_code() {
        let parser = MessageParser::default();
        let record = parser.parse_status("SM1", "delivered", Some(""), "whatsapp:+1");
        assert_eq!(record.error_code, None);
        assert_eq!(record.status, "delivered");
    }
}
