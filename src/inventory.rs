//! Cross-hop balance ledger
//!
//! One [`Inventory`] is created per routing request and shared by reference
//! across the sequential hops simulated for that request; it caps how much of
//! a token the whole path may consume. Balances are plain integers in the
//! token's smallest units; decimal conventions are the caller's business.

use std::collections::HashMap;

use num_bigint::BigUint;
use parking_lot::RwLock;

use crate::error::SimulatorError;

/// Concurrency-safe token balance map. A single lock guards the entire map,
/// admitting many concurrent readers or one writer.
#[derive(Debug, Default)]
pub struct Inventory {
    balances: RwLock<HashMap<String, BigUint>>,
}

impl Inventory {
    pub fn new(balances: HashMap<String, BigUint>) -> Self {
        Self { balances: RwLock::new(balances) }
    }

    /// Returns a snapshot of the token's balance. Unknown tokens report a
    /// balance of zero rather than an error.
    pub fn get_balance(&self, token: &str) -> BigUint {
        self.balances
            .read()
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    /// Moves value through the ledger under one exclusive acquisition:
    /// decreases `decrease_token` by `decrease_by` and increases
    /// `increase_token` by `increase_by`, atomically with respect to other
    /// callers.
    ///
    /// Both tokens must already be tracked and the decrease must be covered;
    /// all checks precede both mutations, so a failure leaves both balances
    /// untouched. Returns snapshots of the two resulting balances.
    pub fn update_balance(
        &self,
        decrease_token: &str,
        increase_token: &str,
        decrease_by: &BigUint,
        increase_by: &BigUint,
    ) -> Result<(BigUint, BigUint), SimulatorError> {
        let mut balances = self.balances.write();

        let decreased = balances
            .get(decrease_token)
            .cloned()
            .ok_or_else(|| SimulatorError::TokenNotTracked {
                token: decrease_token.to_string(),
            })?;

        if decreased < *decrease_by {
            return Err(SimulatorError::InsufficientBalance {
                token: decrease_token.to_string(),
            });
        }

        let increased = balances
            .get(increase_token)
            .cloned()
            .ok_or_else(|| SimulatorError::TokenNotTracked {
                token: increase_token.to_string(),
            })?;

        let new_decreased = &decreased - decrease_by;
        let new_increased = &increased + increase_by;

        balances.insert(decrease_token.to_string(), new_decreased.clone());
        balances.insert(increase_token.to_string(), new_increased.clone());

        Ok((new_decreased, new_increased))
    }
}
