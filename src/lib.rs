pub mod admission;
pub mod config;
pub mod cors;
pub mod error;
pub mod ledger;
pub mod listings;
pub mod metrics;
pub mod proxy;
pub mod registry;
pub mod routes;
pub mod settlement;
pub mod state;
pub mod usage;
pub mod validation;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use ledger::Ledger;
pub use registry::{Registry, RegistryEntry};
pub use state::AppState;
