use crate::error::GatewayError;
use crate::ledger::Ledger;
use crate::registry::{Registry, RegistryEntry};

/// Header carrying the caller's wallet identity.
///
/// The header is trusted as-is, with no cryptographic proof (see DESIGN.md).
pub const WALLET_HEADER: &str = "X-Wallet-Address";

/// An admitted request: the only state that proceeds to the forwarder.
#[derive(Debug, Clone)]
pub struct Admission {
    pub entry: RegistryEntry,
    /// Path portion beyond the matched slug, including its leading `/`
    pub remainder: String,
    pub caller: String,
}

/// Pre-forward admission control: resolve the route, require an identity,
/// require sufficient balance. A pure predicate chain — no money moves here;
/// the debit happens at settlement, after the origin call.
pub fn admit(
    registry: &Registry,
    ledger: &Ledger,
    path: &str,
    caller: Option<&str>,
) -> Result<Admission, GatewayError> {
    let (entry, remainder) = registry
        .resolve(path)?
        .ok_or_else(|| GatewayError::RouteNotFound(path.to_string()))?;

    let caller = match caller.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => return Err(GatewayError::MissingIdentity),
    };

    let available = ledger.balance(&caller)?;
    if available < entry.price_per_call {
        return Err(GatewayError::InsufficientFunds {
            required: entry.price_per_call,
            available,
        });
    }

    Ok(Admission {
        entry,
        remainder,
        caller,
    })
}
