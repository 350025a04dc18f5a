//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::messaging::{AllowAll, Allowlist, SenderPolicy};
use crate::application::services::MatchStrategy;
use crate::domain::entities::command::DEFAULT_RESPONSE;
use crate::domain::entities::{CommandEntry, CommandTable};

/// Sandbox sender used when no WhatsApp number is configured
pub const SANDBOX_NUMBER: &str = "+14155238886";

/// Service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub server: ServerConfig,
    pub carrier: CarrierConfig,
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
    pub whitelist: WhitelistConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CarrierConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub whatsapp_number: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub log_dir: PathBuf,
    pub log_prefix: String,
    pub status_dir: PathBuf,
    pub status_prefix: String,
    pub io_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClassifierConfig {
    pub strategy: MatchStrategy,
    /// Replaces the built-in table when set. Order is match order.
    pub commands: Option<Vec<CommandConfig>>,
    pub default_response: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandConfig {
    pub trigger: String,
    pub response: String,
}

/// Sender allowlist for inbound messages
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WhitelistConfig {
    pub enabled: bool,
    pub users: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            whatsapp_number: None,
            api_base: "https://api.twilio.com".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_prefix: "whatsapp_logs".to_string(),
            status_dir: PathBuf::from("status_logs"),
            status_prefix: "status".to_string(),
            io_timeout_ms: 2000,
        }
    }
}

impl CarrierConfig {
    /// Both credentials are present and non-blank
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.account_sid) && present(&self.auth_token)
    }

    pub fn sender_number(&self) -> &str {
        self.whatsapp_number
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(SANDBOX_NUMBER)
    }
}

impl StorageConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl ClassifierConfig {
    /// Build the command table, falling back to the built-in one
    pub fn command_table(&self) -> Result<CommandTable, ConfigError> {
        let Some(commands) = &self.commands else {
            let mut table = CommandTable::builtin();
            if let Some(default) = &self.default_response {
                table = CommandTable::new(table.entries().cloned().collect(), default.clone());
            }
            return Ok(table);
        };

        let entries = commands
            .iter()
            .map(|c| {
                CommandEntry::new(c.trigger.as_str(), c.response.as_str()).ok_or_else(|| {
                    ConfigError::InvalidValue(format!("blank trigger for response {:?}", c.response))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let default = self
            .default_response
            .clone()
            .unwrap_or_else(|| DEFAULT_RESPONSE.to_string());
        Ok(CommandTable::new(entries, default))
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Access policy for inbound senders
    pub fn sender_policy(&self) -> Arc<dyn SenderPolicy> {
        if !self.whitelist.enabled {
            return Arc::new(AllowAll); // Whitelist disabled, allow all
        }
        let allowlist = Allowlist::new(&self.whitelist.users);
        if allowlist.is_empty() {
            tracing::warn!("Whitelist enabled with no users, every sender will be refused");
        } else {
            tracing::info!(users = allowlist.len(), "Sender whitelist enabled");
        }
        Arc::new(allowlist)
    }

    pub fn load_env() -> Self {
        Config::default().apply_env()
    }

    /// Overlay environment variables on top of this config
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(sid) = var("TWILIO_ACCOUNT_SID") {
            self.carrier.account_sid = Some(sid);
        }
        if let Some(token) = var("TWILIO_AUTH_TOKEN") {
            self.carrier.auth_token = Some(token);
        }
        if let Some(number) = var("TWILIO_WHATSAPP_NUMBER") {
            self.carrier.whatsapp_number = Some(number);
        }
        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT: {}", port),
            }
        }
        if let Some(dir) = var("LOG_DIR") {
            self.storage.log_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("STATUS_LOG_DIR") {
            self.storage.status_dir = PathBuf::from(dir);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.log_dir, PathBuf::from("logs"));
        assert_eq!(config.storage.status_prefix, "status");
        assert!(!config.carrier.is_configured());
        assert_eq!(config.carrier.sender_number(), SANDBOX_NUMBER);
        assert!(!config.whitelist.enabled);
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml(
            "server:\n  port: 8080\nclassifier:\n  strategy: exact-then-substring\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.classifier.strategy, MatchStrategy::ExactThenSubstring);
    }

    #[test]
    fn test_yaml_roundtrip_of_default() {
        let yaml = Config::default().to_yaml().unwrap();
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.storage.io_timeout_ms, 2000);
    }

    #[test]
    fn test_custom_command_table_keeps_order() {
        let config = Config::from_yaml(
            "classifier:\n  commands:\n    - trigger: Price\n      response: p\n    - trigger: price list\n      response: l\n  default-response: d\n",
        )
        .unwrap();
        let table = config.classifier.command_table().unwrap();
        let triggers: Vec<&str> = table.entries().map(|e| e.trigger()).collect();
        assert_eq!(triggers, vec!["price", "price list"]);
        assert_eq!(table.default_response(), "d");
    }

    #[test]
    fn test_blank_trigger_rejected() {
        let config = Config::from_yaml(
            "classifier:\n  commands:\n    - trigger: \"  \"\n      response: p\n",
        )
        .unwrap();
        assert!(matches!(
            config.classifier.command_table(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_WHATSAPP_NUMBER", "+15550009999"),
            ("PORT", "9000"),
            ("LOG_DIR", "/var/log/wa"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().apply_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert!(config.carrier.is_configured());
        assert_eq!(config.carrier.sender_number(), "+15550009999");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.log_dir, PathBuf::from("/var/log/wa"));
    }

    #[test]
    fn test_invalid_port_ignored() {
        let config = Config::default().apply_vars(|k| (k == "PORT").then(|| "abc".to_string()));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_whitelist() {
        let mut config = Config::default();
        assert!(config.sender_policy().allows("whatsapp:+1"));
        config.whitelist.enabled = true;
        config.whitelist.users = vec!["+15550001111".to_string()];
        let policy = config.sender_policy();
        assert!(policy.allows("whatsapp:+15550001111"));
        assert!(!policy.allows("whatsapp:+15550002222"));
    }
}
