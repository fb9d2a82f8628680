use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::ledger::Ledger;
use crate::registry::Registry;
use crate::usage::UsageLog;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub registry: Arc<Registry>,
    pub ledger: Arc<Ledger>,
    pub usage: Arc<UsageLog>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.forward_timeout)
            .redirect(reqwest::redirect::Policy::none()) // Prevent SSRF via redirects
            .build()
            .expect("failed to create HTTP client");

        Self {
            config: Arc::new(config),
            registry: Arc::new(Registry::new()),
            ledger: Arc::new(Ledger::new()),
            usage: Arc::new(UsageLog::new()),
            http_client,
        }
    }
}
