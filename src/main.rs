use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

mod domain;
mod application;
mod infrastructure;

use application::errors::{BotError, ConfigError};
use application::services::{Classifier, InboundOutcome, MessageService};
use domain::entities::{Exchange, StatusRecord};
use domain::traits::{BestEffort, Carrier};
use infrastructure::adapters::console::{ConsoleCarrier, ConsolePrompt};
use infrastructure::adapters::http::{self, AppState};
use infrastructure::adapters::twilio::{TwilioCarrier, UnconfiguredCarrier};
use infrastructure::config::Config;
use infrastructure::storage::{DailyLogStore, MemoryStore};

#[derive(Parser)]
#[command(name = "wa-responder")]
#[command(about = "Keyword auto-responder for WhatsApp webhooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chat with the responder on stdin
    Console,
    /// Print the reply for one message
    Classify {
        text: String,
    },
    /// Rewrite legacy JSON day files as line-delimited logs
    MigrateLogs,
    /// Generate default config
    InitConfig,
    /// Show version
    Version,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port } => run_async(serve(load_config(&cli.config), port)),
        Commands::Console => run_async(console(load_config(&cli.config))),
        Commands::Classify { text } => classify(&load_config(&cli.config), &text),
        Commands::MigrateLogs => run_async(migrate_logs(load_config(&cli.config))),
        Commands::InitConfig => init_config(&cli.config),
        Commands::Version => {
            println!("wa-responder v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run_async<F>(future: F) -> Result<(), BotError>
where
    F: std::future::Future<Output = Result<(), BotError>>,
{
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;
    rt.block_on(future)
}

fn load_config(path: &str) -> Config {
    if !Path::new(path).exists() {
        return Config::load_env();
    }
    match Config::load(path) {
        Ok(config) => config.apply_env(),
        Err(e) => {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        }
    }
}

fn build_classifier(config: &Config) -> Result<Arc<Classifier>, ConfigError> {
    let table = config.classifier.command_table()?;
    if table.is_empty() {
        tracing::warn!("Command table is empty, every message gets the default response");
    }
    tracing::info!(
        commands = table.len(),
        strategy = ?config.classifier.strategy,
        "Command table loaded"
    );
    Ok(Arc::new(Classifier::new(table, config.classifier.strategy)))
}

/// Twilio when credentials are present, otherwise a carrier that refuses
/// every send
fn build_carrier(config: &Config) -> Arc<dyn Carrier> {
    match TwilioCarrier::from_config(&config.carrier) {
        Ok(carrier) => Arc::new(carrier),
        Err(e) => {
            tracing::warn!("{}; outbound messages will be refused", e);
            Arc::new(UnconfiguredCarrier::new(e.to_string(), config.carrier.sender_number()))
        }
    }
}

fn exchange_store(config: &Config) -> DailyLogStore<Exchange> {
    DailyLogStore::new(&config.storage.log_dir, config.storage.log_prefix.as_str())
        .with_timeout(config.storage.io_timeout())
}

fn status_store(config: &Config) -> DailyLogStore<StatusRecord> {
    DailyLogStore::new(&config.storage.status_dir, config.storage.status_prefix.as_str())
        .with_timeout(config.storage.io_timeout())
}

async fn serve(config: Config, port: Option<u16>) -> Result<(), BotError> {
    let carrier = build_carrier(&config);
    let info = carrier.carrier_info();
    tracing::info!(carrier = %info.name, from = %info.from, configured = info.configured, "Carrier ready");

    let service = MessageService::new(
        build_classifier(&config)?,
        carrier,
        BestEffort::new(Arc::new(exchange_store(&config)), "exchanges"),
        BestEffort::new(Arc::new(status_store(&config)), "statuses"),
    )
    .with_policy(config.sender_policy());

    let host = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|e| ConfigError::InvalidValue(format!("server.host {}: {}", config.server.host, e)))?;
    let addr = SocketAddr::new(host, port.unwrap_or(config.server.port));

    let state = AppState {
        service: Arc::new(service),
    };
    http::serve(addr, state)
        .await
        .map_err(|e| BotError::Internal(format!("Server error: {}", e)))
}

async fn console(config: Config) -> Result<(), BotError> {
    let exchanges = Arc::new(MemoryStore::<Exchange>::new());
    let service = MessageService::new(
        build_classifier(&config)?,
        Arc::new(ConsoleCarrier::new(config.carrier.sender_number())),
        BestEffort::new(exchanges.clone(), "exchanges"),
        BestEffort::new(Arc::new(MemoryStore::<StatusRecord>::new()), "statuses"),
    );

    println!("wa-responder console. Type /commands to list triggers, /history for this session, /quit to exit.");
    let mut prompt = ConsolePrompt::new();
    while let Some(line) = prompt.read_line("> ").await {
        match line.as_str() {
            "/quit" | "/exit" => break,
            "/commands" => print!("{}", service.classifier().describe()),
            "/history" => {
                for exchange in exchanges.records().await {
                    println!(
                        "{} {}: {}",
                        exchange.timestamp.format("%H:%M:%S"),
                        exchange.direction.as_str(),
                        exchange.preview()
                    );
                }
            }
            _ => match service.handle_inbound("console", &line).await {
                Ok(InboundOutcome::Reply(text)) => println!("[BOT] {}", text),
                Ok(InboundOutcome::Denied) => println!("[BOT] (no reply)"),
                Err(e) => println!("[BOT] {}", e),
            },
        }
    }

    tracing::info!("Console session ended after {} exchanges", exchanges.len().await);
    Ok(())
}

fn classify(config: &Config, text: &str) -> Result<(), BotError> {
    let classifier = build_classifier(config)?;
    println!("{}", classifier.classify(text));
    Ok(())
}

async fn migrate_logs(config: Config) -> Result<(), BotError> {
    let exchanges = exchange_store(&config).migrate_legacy().await?;
    let statuses = status_store(&config).migrate_legacy().await?;
    println!(
        "Migrated {} exchange log(s) and {} status log(s)",
        exchanges, statuses
    );
    Ok(())
}

fn init_config(path: &str) -> Result<(), BotError> {
    if Path::new(path).exists() {
        return Err(ConfigError::InvalidValue(format!("{} already exists", path)).into());
    }
    let yaml = Config::default().to_yaml()?;
    std::fs::write(path, yaml).map_err(ConfigError::from)?;
    println!("Wrote default config to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::errors::CarrierError;

    #[tokio::test]
    async fn test_serve_without_credentials_refuses_sends() {
        let config = Config::default();
        let exchanges = Arc::new(MemoryStore::<Exchange>::new());
        let service = MessageService::new(
            build_classifier(&config).unwrap(),
            build_carrier(&config),
            BestEffort::new(exchanges.clone(), "exchanges"),
            BestEffort::new(Arc::new(MemoryStore::<StatusRecord>::new()), "statuses"),
        );

        assert!(!service.carrier().carrier_info().configured);
        let result = service
            .send_outbound(Some("+966500000000"), Some("hi"))
            .await;
        assert!(matches!(
            result,
            Err(BotError::Carrier(CarrierError::NotConfigured(_)))
        ));
        assert_eq!(exchanges.len().await, 0);
    }
}
