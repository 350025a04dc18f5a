//! Twilio adapter

pub mod twiml;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::application::errors::CarrierError;
use crate::domain::traits::{Carrier, CarrierInfo, SentMessage};
use crate::infrastructure::config::CarrierConfig;

/// Twilio REST API version path
const API_VERSION: &str = "2010-04-01";

/// Twilio carrier adapter for WhatsApp messages
pub struct TwilioCarrier {
    account_sid: String,
    auth_token: String,
    api_base: String,
    client: Client,
    info: CarrierInfo,
}

impl TwilioCarrier {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: &str,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            api_base: "https://api.twilio.com".to_string(),
            client: Client::new(),
            info: CarrierInfo {
                name: "twilio".to_string(),
                from: format!("whatsapp:{}", from_number),
                configured: true,
            },
        }
    }

    pub fn from_config(config: &CarrierConfig) -> Result<Self, CarrierError> {
        let (Some(sid), Some(token)) = (&config.account_sid, &config.auth_token) else {
            return Err(CarrierError::NotConfigured(
                "TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN must be set".to_string(),
            ));
        };
        if !config.is_configured() {
            return Err(CarrierError::NotConfigured("blank Twilio credentials".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CarrierError::Network(e.to_string()))?;

        let mut carrier = Self::new(sid.as_str(), token.as_str(), config.sender_number());
        carrier.client = client;
        carrier.api_base = config.api_base.trim_end_matches('/').to_string();
        Ok(carrier)
    }

    /// Get the Messages resource URL
    fn messages_url(&self) -> String {
        format!(
            "{}/{}/Accounts/{}/Messages.json",
            self.api_base, API_VERSION, self.account_sid
        )
    }
}

#[async_trait]
impl Carrier for TwilioCarrier {
    async fn send_message(&self, to: &str, body: &str) -> Result<SentMessage, CarrierError> {
        #[derive(Deserialize)]
        struct MessageResource {
            sid: String,
            status: String,
        }

        #[derive(Deserialize)]
        struct ApiError {
            message: String,
        }

        let params = [
            ("From", self.info.from.as_str()),
            ("To", to),
            ("Body", body),
        ];

        let response = self.client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| CarrierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(CarrierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| CarrierError::Parse(e.to_string()))?;

        Ok(SentMessage {
            sid: resource.sid,
            status: resource.status,
        })
    }

    fn carrier_info(&self) -> CarrierInfo {
        self.info.clone()
    }
}

/// Stands in for Twilio when credentials are missing. Every send fails
/// with [`CarrierError::NotConfigured`] so callers see the delivery failure.
pub struct UnconfiguredCarrier {
    reason: String,
    info: CarrierInfo,
}

impl UnconfiguredCarrier {
    pub fn new(reason: impl Into<String>, from_number: &str) -> Self {
        Self {
            reason: reason.into(),
            info: CarrierInfo {
                name: "twilio (unconfigured)".to_string(),
                from: format!("whatsapp:{}", from_number),
                configured: false,
            },
        }
    }
}

#[async_trait]
impl Carrier for UnconfiguredCarrier {
    async fn send_message(&self, to: &str, _body: &str) -> Result<SentMessage, CarrierError> {
        tracing::warn!(to, "Refusing outbound message, carrier not configured");
        Err(CarrierError::NotConfigured(self.reason.clone()))
    }

    fn carrier_info(&self) -> CarrierInfo {
        self.info.clone()
    }
}
