use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Art Blocks core contract on mainnet.
pub const DEFAULT_CONTRACT: &str = "0xa7d8d9ef8D8Ce8992Df33D8b8CF4Aebabd5bD270";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
    #[serde(default = "default_marketplaces")]
    pub marketplaces: Vec<MarketplaceConfig>,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Websocket endpoint; `${ALCHEMY_API_KEY}` is substituted from the
    /// environment at startup.
    #[serde(default = "default_rpc_ws")]
    pub rpc_ws: String,
    #[serde(default = "default_rpc_http")]
    pub rpc_http: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_contract")]
    pub contract: String,
    #[serde(default = "default_min_price_eth")]
    pub min_price_eth: f64,
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
    #[serde(default = "default_dedup_ttl_ms")]
    pub dedup_ttl_ms: u64,
    #[serde(default = "default_pending_channel_size")]
    pub pending_channel_size: usize,
    #[serde(default = "default_ws_reconnect_base_ms")]
    pub ws_reconnect_base_ms: u64,
    #[serde(default = "default_ws_reconnect_max_ms")]
    pub ws_reconnect_max_ms: u64,
    #[serde(default = "default_tx_fetch_timeout_ms")]
    pub tx_fetch_timeout_ms: u64,
    #[serde(default = "default_tx_fetch_attempts")]
    pub tx_fetch_attempts: u32,
    #[serde(default = "default_tx_fetch_retry_base_ms")]
    pub tx_fetch_retry_base_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsConfig {
    /// Treat unlisted projects as curated with a synthesized name. Stand-in
    /// until an authoritative registry feed exists.
    #[serde(default = "default_true")]
    pub assume_curated: bool,
    #[serde(default)]
    pub curated: Vec<ProjectConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_true")]
    pub curated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    pub address: String,
    pub name: String,
    /// Token id is appended verbatim when building the notification link.
    pub item_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
    #[serde(default = "default_true")]
    pub announce_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_health_bind")]
    pub health_bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_bind")]
    pub metrics_bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    /// Optional TOML file overlaid with `SALESBOT__`-prefixed environment
    /// variables; every field has a default so env-only deployments work.
    pub fn load(path: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SALESBOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_ws: default_rpc_ws(),
            rpc_http: default_rpc_http(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            contract: default_contract(),
            min_price_eth: default_min_price_eth(),
            dedup_capacity: default_dedup_capacity(),
            dedup_ttl_ms: default_dedup_ttl_ms(),
            pending_channel_size: default_pending_channel_size(),
            ws_reconnect_base_ms: default_ws_reconnect_base_ms(),
            ws_reconnect_max_ms: default_ws_reconnect_max_ms(),
            tx_fetch_timeout_ms: default_tx_fetch_timeout_ms(),
            tx_fetch_attempts: default_tx_fetch_attempts(),
            tx_fetch_retry_base_ms: default_tx_fetch_retry_base_ms(),
        }
    }
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            assume_curated: true,
            curated: Vec::new(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            min_interval_ms: default_min_interval_ms(),
            max_attempts: default_max_attempts(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
            announce_on_start: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            health_bind: default_health_bind(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_bind: default_metrics_bind(),
            log_level: default_log_level(),
        }
    }
}

fn default_rpc_ws() -> String {
    "wss://eth-mainnet.g.alchemy.com/v2/${ALCHEMY_API_KEY}".to_string()
}

fn default_rpc_http() -> String {
    "https://eth-mainnet.g.alchemy.com/v2/${ALCHEMY_API_KEY}".to_string()
}

fn default_contract() -> String {
    DEFAULT_CONTRACT.to_string()
}

fn default_min_price_eth() -> f64 {
    0.5
}

fn default_dedup_capacity() -> usize {
    100_000
}

fn default_dedup_ttl_ms() -> u64 {
    // 24h retention window
    86_400_000
}

fn default_pending_channel_size() -> usize {
    1_024
}

fn default_ws_reconnect_base_ms() -> u64 {
    500
}

fn default_ws_reconnect_max_ms() -> u64 {
    30_000
}

fn default_tx_fetch_timeout_ms() -> u64 {
    5_000
}

fn default_tx_fetch_attempts() -> u32 {
    3
}

fn default_tx_fetch_retry_base_ms() -> u64 {
    250
}

fn default_queue_capacity() -> usize {
    128
}

fn default_min_interval_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    4
}

fn default_retry_base_ms() -> u64 {
    1_000
}

fn default_retry_max_ms() -> u64 {
    60_000
}

fn default_health_bind() -> String {
    match std::env::var("PORT") {
        Ok(port) if !port.trim().is_empty() => format!("0.0.0.0:{}", port.trim()),
        _ => "0.0.0.0:3000".to_string(),
    }
}

fn default_metrics_bind() -> String {
    "127.0.0.1:9464".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_marketplaces() -> Vec<MarketplaceConfig> {
    vec![
        MarketplaceConfig {
            address: "0x7f268357a8c2552623316e2562d90e642bb538e5".to_string(),
            name: "OpenSea".to_string(),
            item_url: format!("https://opensea.io/assets/ethereum/{DEFAULT_CONTRACT}/"),
        },
        MarketplaceConfig {
            address: "0x59728544b08ab483533076417fbbb2fd0b17ce3a".to_string(),
            name: "LooksRare".to_string(),
            item_url: format!("https://looksrare.org/collections/{DEFAULT_CONTRACT}/"),
        },
    ]
}
