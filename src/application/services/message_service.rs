use std::sync::Arc;

use crate::application::errors::{BotError, ValidationError};
use crate::application::messaging::{AllowAll, MessageParser, SenderPolicy};
use crate::domain::entities::{Exchange, StatusRecord};
use crate::domain::traits::{BestEffort, Carrier, SentMessage};

use super::Classifier;

/// What the webhook should answer for an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Canned response to send back to the sender
    Reply(String),
    /// Sender rejected by the access policy; nothing is sent or recorded
    Denied,
}

/// Service for processing inbound messages, outbound sends and delivery
/// status callbacks
pub struct MessageService {
    classifier: Arc<Classifier>,
    carrier: Arc<dyn Carrier>,
    exchanges: BestEffort<Exchange>,
    statuses: BestEffort<StatusRecord>,
    policy: Arc<dyn SenderPolicy>,
    parser: MessageParser,
}

impl MessageService {
    pub fn new(
        classifier: Arc<Classifier>,
        carrier: Arc<dyn Carrier>,
        exchanges: BestEffort<Exchange>,
        statuses: BestEffort<StatusRecord>,
    ) -> Self {
        Self {
            classifier,
            carrier,
            exchanges,
            statuses,
            policy: Arc::new(AllowAll),
            parser: MessageParser::default(),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn SenderPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn carrier(&self) -> &dyn Carrier {
        self.carrier.as_ref()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify an inbound message and record the exchange.
    ///
    /// Recording is best-effort: a failed write never changes the reply.
    pub async fn handle_inbound(
        &self,
        sender: &str,
        body: &str,
    ) -> Result<InboundOutcome, ValidationError> {
        let message = self.parser.parse_inbound(sender, body)?;

        if !self.policy.allows(&message.sender) {
            tracing::warn!(sender = %message.sender, "Sender not in allowlist, ignoring message");
            return Ok(InboundOutcome::Denied);
        }

        let response = self.classifier.classify(&message.body).to_string();
        let exchange = Exchange::incoming(&message.sender, &message.body, &response);
        tracing::info!(
            sender = %exchange.sender,
            direction = exchange.direction.as_str(),
            "{}...",
            exchange.preview()
        );
        self.exchanges.submit(&exchange).await;

        Ok(InboundOutcome::Reply(response))
    }

    /// Push a message through the carrier and record it as outgoing.
    ///
    /// Validation happens before the carrier is touched.
    pub async fn send_outbound(
        &self,
        to: Option<&str>,
        message: Option<&str>,
    ) -> Result<SentMessage, BotError> {
        let request = self.parser.parse_outbound(to, message)?;
        let recipient = self.parser.address(&request.to);

        let sent = self.carrier.send_message(&recipient, &request.message).await?;
        tracing::info!(to = %recipient, sid = %sent.sid, status = %sent.status, "Outbound message accepted");

        self.exchanges
            .submit(&Exchange::outgoing(&recipient, &request.message))
            .await;

        Ok(sent)
    }

    /// Persist a delivery-status callback. Failed deliveries additionally
    /// produce one error-level diagnostic.
    pub async fn record_status(&self, record: StatusRecord) -> bool {
        tracing::info!(message_id = %record.message_id, status = %record.status, "Message status update");

        if record.is_failure() {
            tracing::error!(
                message_id = %record.message_id,
                error_code = record.error_code.as_deref().unwrap_or(""),
                to = %record.recipient,
                "Message delivery failed"
            );
        }

        self.statuses.submit(&record).await
    }

    /// Parse raw callback fields, then [`Self::record_status`]
    pub async fn record_status_fields(
        &self,
        message_id: &str,
        status: &str,
        error_code: Option<&str>,
        recipient: &str,
    ) -> bool {
        let record = self
            .parser
            .parse_status(message_id, status, error_code, recipient);
        self.record_status(record).await
    }
}
