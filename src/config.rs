use std::env;
use std::time::Duration;

use url::Url;

const DEFAULT_PORT: u16 = 4021;
const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DEMO_BALANCE: f64 = 100.0;

#[derive(Clone)]
pub struct GatewayConfig {
    /// Server port
    pub port: u16,
    /// Public base URL used when handing out gateway URLs after registration
    pub public_url: String,
    /// Timeout applied to every forwarded origin call
    pub forward_timeout: Duration,
    /// Listings API to seed the registry from at startup (None = start empty)
    pub listings_url: Option<String>,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    /// Allow http:// and private/loopback origin hosts (dev and tests only)
    pub allow_private_origins: bool,
    /// Bearer token required for /metrics (None = public)
    pub metrics_token: Option<String>,
    /// Pre-funded demo wallet (None = no demo account)
    pub demo_wallet: Option<String>,
    /// Starting balance for the demo wallet
    pub demo_balance: f64,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("port", &self.port)
            .field("public_url", &self.public_url)
            .field("forward_timeout", &self.forward_timeout)
            .field("listings_url", &self.listings_url)
            .field("allowed_origins", &self.allowed_origins)
            .field("allow_private_origins", &self.allow_private_origins)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("demo_wallet", &self.demo_wallet)
            .field("demo_balance", &self.demo_balance)
            .finish()
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidPort(s))?,
            Err(_) => DEFAULT_PORT,
        };

        let public_url =
            env::var("PUBLIC_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));
        Url::parse(&public_url).map_err(|_| ConfigError::InvalidUrl(public_url.clone()))?;

        let forward_timeout = match env::var("FORWARD_TIMEOUT_SECS") {
            Ok(s) => {
                let secs: u64 = s.parse().map_err(|_| ConfigError::InvalidTimeout(s))?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_FORWARD_TIMEOUT_SECS),
        };

        let listings_url = env::var("LISTINGS_URL").ok().filter(|s| !s.is_empty());
        if let Some(ref url) = listings_url {
            Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
        }

        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:5174".to_string(),
                ]
            });

        let allow_private_origins = env::var("ALLOW_PRIVATE_ORIGINS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let metrics_token = env::var("METRICS_TOKEN").ok().filter(|s| !s.is_empty());
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set — /metrics endpoint is publicly accessible");
        }

        let demo_wallet = env::var("DEMO_WALLET").ok().filter(|s| !s.is_empty());
        let demo_balance = match env::var("DEMO_BALANCE") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidBalance(s))?,
            Err(_) => DEFAULT_DEMO_BALANCE,
        };

        Ok(Self {
            port,
            public_url,
            forward_timeout,
            listings_url,
            allowed_origins,
            allow_private_origins,
            metrics_token,
            demo_wallet,
            demo_balance,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("invalid demo balance: {0}")]
    InvalidBalance(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_metrics_token() {
        let config = GatewayConfig {
            port: 4021,
            public_url: "http://localhost:4021".to_string(),
            forward_timeout: Duration::from_secs(10),
            listings_url: None,
            allowed_origins: vec![],
            allow_private_origins: false,
            metrics_token: Some("super-secret".to_string()),
            demo_wallet: None,
            demo_balance: 0.0,
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
