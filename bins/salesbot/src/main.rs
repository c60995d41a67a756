use alloy::primitives::Bytes;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use gallery_bot::orchestrator::Pipeline;
use gallery_bot::Bot;
use gallery_chain::{NodeClient, ReconnectConfig, TxFetcher};
use gallery_core::config::AppConfig;
use gallery_core::dedupe::DedupeCache;
use gallery_core::types::PendingTx;
use gallery_core::utils::{now_ms, parse_address, parse_b256, parse_u256};
use gallery_sale::{decode_sale, Marketplaces, ProjectRegistry, SaleFilter};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "salesbot", version, about = "Art Blocks curated sales notifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch pending transactions and post sale notifications.
    Run {
        #[arg(short, long, default_value = "config/salesbot.toml")]
        config: String,
    },
    /// Decode and filter recorded pending transactions offline.
    Replay {
        #[arg(short, long, default_value = "samples/pending_txs.json")]
        file: String,
        #[arg(short, long, default_value = "config/salesbot.toml")]
        config: String,
    },
    /// Fetch one transaction by hash and decode it.
    TestDecode {
        #[arg(short, long, default_value = "config/salesbot.toml")]
        config: String,
        #[arg(long)]
        tx: String,
    },
    PrintConfig {
        #[arg(short, long, default_value = "config/salesbot.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let mut bot = Bot::new(cfg).await?;
            bot.run().await?;
        }
        Commands::Replay { file, config } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let pipeline = build_pipeline(&cfg)?;
            let data = std::fs::read_to_string(file)?;
            let entries: Vec<ReplayEntry> = serde_json::from_str(&data)?;
            for entry in entries {
                let tx = entry.into_pending_tx()?;
                match pipeline.process(&tx, now_ms()) {
                    Ok(notification) => {
                        println!("{} -> notify\n{}\n", tx.hash, notification.text)
                    }
                    Err(skip) => println!("{} -> skip ({skip:?})", tx.hash),
                }
            }
        }
        Commands::TestDecode { config, tx } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let contract = parse_address(&cfg.watch.contract)?;
            let client = NodeClient::connect(&cfg.chain).await?;
            let fetcher = TxFetcher::new(
                client.http,
                cfg.watch.tx_fetch_timeout_ms,
                cfg.watch.tx_fetch_attempts,
                ReconnectConfig::new(cfg.watch.tx_fetch_retry_base_ms, cfg.watch.tx_fetch_timeout_ms),
            );
            let hash = parse_b256(&tx).map_err(|_| anyhow!("invalid tx hash"))?;
            match fetcher.fetch(hash).await? {
                Some(tx) => match decode_sale(&tx, contract) {
                    Ok(candidate) => println!("Decoded: {candidate:?}"),
                    Err(reject) => println!("Not a sale: {reject:?}"),
                },
                None => println!("Transaction not found"),
            }
        }
        Commands::PrintConfig { config } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let json = serde_json::to_string_pretty(&cfg)?;
            println!("{json}");
        }
    }

    info!("done");
    Ok(())
}

fn build_pipeline(cfg: &AppConfig) -> Result<Pipeline> {
    let contract = parse_address(&cfg.watch.contract)?;
    let registry = ProjectRegistry::from_config(&cfg.projects);
    let marketplaces = Marketplaces::from_config(&cfg.marketplaces)?;
    let filter = SaleFilter::new(registry, marketplaces, cfg.watch.min_price_eth);
    let dedupe = DedupeCache::new(cfg.watch.dedup_capacity, cfg.watch.dedup_ttl_ms);
    Ok(Pipeline::new(contract, filter, dedupe))
}

fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        Err(_) => EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(serde::Deserialize)]
struct ReplayEntry {
    hash: String,
    from: String,
    to: Option<String>,
    input: String,
    value: String,
}

impl ReplayEntry {
    fn into_pending_tx(self) -> Result<PendingTx> {
        let input = hex::decode(self.input.trim_start_matches("0x"))?;
        Ok(PendingTx {
            hash: parse_b256(&self.hash)?,
            from: parse_address(&self.from)?,
            to: self.to.as_deref().map(parse_address).transpose()?,
            input: Bytes::from(input),
            value: parse_u256(&self.value)?,
            first_seen_ms: now_ms(),
        })
    }
}
