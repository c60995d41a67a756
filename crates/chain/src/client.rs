use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use anyhow::{anyhow, Result};
use gallery_core::config::ChainConfig;

const API_KEY_PLACEHOLDER: &str = "${ALCHEMY_API_KEY}";

#[derive(Clone)]
pub struct NodeClient {
    pub ws: DynProvider,
    pub http: DynProvider,
}

impl NodeClient {
    pub async fn connect(cfg: &ChainConfig) -> Result<Self> {
        let ws_url = resolve_endpoint(&cfg.rpc_ws)?;
        let http_url = resolve_endpoint(&cfg.rpc_http)?;
        let ws = ProviderBuilder::new().connect(&ws_url).await?.erased();
        let http = ProviderBuilder::new().connect(&http_url).await?.erased();
        Ok(Self { ws, http })
    }
}

/// Substitutes the provider API key from the environment. Fails when the
/// endpoint still needs a key and none is set, so the caller can degrade
/// instead of dialing a broken URL.
pub fn resolve_endpoint(raw: &str) -> Result<String> {
    if !raw.contains(API_KEY_PLACEHOLDER) {
        return Ok(raw.to_string());
    }
    let key = std::env::var("ALCHEMY_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| anyhow!("ALCHEMY_API_KEY not set; cannot resolve rpc endpoint"))?;
    Ok(raw.replace(API_KEY_PLACEHOLDER, &key))
}

#[cfg(test)]
mod tests {
    use super::resolve_endpoint;

    #[test]
    fn passthrough_without_placeholder() {
        let url = "wss://node.example/ws";
        assert_eq!(resolve_endpoint(url).unwrap(), url);
    }
}
