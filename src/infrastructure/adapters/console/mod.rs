//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};

use crate::application::errors::CarrierError;
use crate::domain::traits::{Carrier, CarrierInfo, SentMessage};

/// Carrier that prints outbound messages instead of sending them. Used when
/// no carrier credentials are configured.
pub struct ConsoleCarrier {
    info: CarrierInfo,
}

impl ConsoleCarrier {
    pub fn new(from_number: &str) -> Self {
        Self {
            info: CarrierInfo {
                name: "console".to_string(),
                from: format!("whatsapp:{}", from_number),
                configured: false,
            },
        }
    }
}

#[async_trait]
impl Carrier for ConsoleCarrier {
    async fn send_message(&self, to: &str, body: &str) -> Result<SentMessage, CarrierError> {
        println!("[SEND {} -> {}] {}", self.info.from, to, body);
        Ok(SentMessage {
            sid: format!("SM{}", uuid::Uuid::new_v4().simple()),
            status: "queued".to_string(),
        })
    }

    fn carrier_info(&self) -> CarrierInfo {
        self.info.clone()
    }
}

/// Line-oriented stdin reader for the interactive console
pub struct ConsolePrompt {
    lines: tokio::io::Lines<BufReader<Stdin>>,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `prompt` and read one trimmed line; `None` on end of input
    pub async fn read_line(&mut self, prompt: &str) -> Option<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await.ok()?;
        stdout.flush().await.ok()?;
        let line = self.lines.next_line().await.ok()??;
        Some(line.trim().to_string())
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}
