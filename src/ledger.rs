use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::GatewayError;

/// Balances after a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    pub payer_balance: f64,
    pub payee_balance: f64,
}

/// In-memory prepaid balance ledger.
///
/// Consumers and providers share one balance space. All mutation goes through
/// `top_up` and `try_debit_and_credit`; the latter holds the lock across the
/// balance check and both mutations so a concurrent over-limit debit can never
/// slip through.
pub struct Ledger {
    balances: Mutex<HashMap<String, f64>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Returns 0 for unknown identities. Reading never creates an account.
    pub fn balance(&self, identity: &str) -> Result<f64, GatewayError> {
        let balances = self
            .balances
            .lock()
            .map_err(|_| GatewayError::Internal("ledger lock poisoned".to_string()))?;
        Ok(balances.get(identity).copied().unwrap_or(0.0))
    }

    /// Credit an identity unconditionally. Top-up is the only way money
    /// enters the system.
    pub fn top_up(&self, identity: &str, amount: f64) -> Result<f64, GatewayError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(GatewayError::InvalidAmount(format!(
                "top-up amount must be a positive number, got {}",
                amount
            )));
        }
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| GatewayError::Internal("ledger lock poisoned".to_string()))?;
        let balance = balances.entry(identity.to_string()).or_insert(0.0);
        *balance += amount;
        Ok(*balance)
    }

    /// The only path by which money moves between two parties.
    ///
    /// Check-then-mutate is a single critical section: on `InsufficientFunds`
    /// no partial effect is left behind, and a payer balance can never go
    /// negative through settlement.
    pub fn try_debit_and_credit(
        &self,
        payer: &str,
        payee: &str,
        amount: f64,
    ) -> Result<Transfer, GatewayError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(GatewayError::InvalidAmount(format!(
                "transfer amount must be a non-negative number, got {}",
                amount
            )));
        }
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| GatewayError::Internal("ledger lock poisoned".to_string()))?;

        let available = balances.get(payer).copied().unwrap_or(0.0);
        if available < amount {
            return Err(GatewayError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        *balances.entry(payer.to_string()).or_insert(0.0) -= amount;
        *balances.entry(payee.to_string()).or_insert(0.0) += amount;

        Ok(Transfer {
            payer_balance: balances.get(payer).copied().unwrap_or(0.0),
            payee_balance: balances.get(payee).copied().unwrap_or(0.0),
        })
    }

    /// Copy of all balances, for reporting.
    pub fn snapshot(&self) -> Result<HashMap<String, f64>, GatewayError> {
        let balances = self
            .balances
            .lock()
            .map_err(|_| GatewayError::Internal("ledger lock poisoned".to_string()))?;
        Ok(balances.clone())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
