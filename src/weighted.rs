//! Weighted constant-product pool simulator
//!
//! Implements the classical weighted invariant: each bound token carries a
//! (possibly unnormalized) weight, and a swap moves balances along
//! `prod(balance_i ^ weight_i) = k`. The fractional exponent
//! `weight_in / weight_out` is evaluated with the unsigned fixed-point `pow`,
//! and every quote is re-validated against the post-trade spot price to catch
//! rounding-induced economically inconsistent results.

use std::collections::HashMap;

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use serde_json::json;

use crate::error::{MathError, SimulatorError};
use crate::fixed_point::{add, div, mul, pow, sub, ONE};
use crate::pool::{CommitParams, Gas, PoolInfo, PoolSimulator, QuoteResult, TokenAmount};

/// Cap on a single trade relative to the input balance: one half, in
/// fixed-point units. Bounds price impact and approximation error per trade.
pub static MAX_IN_RATIO: Lazy<BigUint> = Lazy::new(|| &*ONE >> 1);

/// Per-token record inside a weighted pool.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub bound: bool,
    pub weight: BigUint,
    pub balance: BigUint,
}

/// Spot price implied by current balances and weights:
/// `(balance_in / weight_in) / (balance_out / weight_out) / (1 - fee)`.
pub fn calc_spot_price(
    balance_in: &BigUint,
    weight_in: &BigUint,
    balance_out: &BigUint,
    weight_out: &BigUint,
    swap_fee: &BigUint,
) -> Result<BigUint, MathError> {
    let numer = div(balance_in, weight_in)?;
    let denom = div(balance_out, weight_out)?;
    let ratio = div(&numer, &denom)?;

    let fee_complement = sub(&ONE, swap_fee)?;
    let scale = div(&ONE, &fee_complement)?;

    mul(&ratio, &scale)
}

/// Output amount for a given input:
/// `balance_out * (1 - (balance_in / (balance_in + amount_in*(1-fee)))^(weight_in/weight_out))`.
pub fn calc_out_given_in(
    balance_in: &BigUint,
    weight_in: &BigUint,
    balance_out: &BigUint,
    weight_out: &BigUint,
    amount_in: &BigUint,
    swap_fee: &BigUint,
) -> Result<BigUint, MathError> {
    let weight_ratio = div(weight_in, weight_out)?;

    let fee_complement = sub(&ONE, swap_fee)?;
    let adjusted_in = mul(amount_in, &fee_complement)?;

    let new_balance_in = add(balance_in, &adjusted_in)?;
    let base = div(balance_in, &new_balance_in)?;

    let power = pow(&base, &weight_ratio)?;
    let complement = sub(&ONE, &power)?;

    mul(balance_out, &complement)
}

/// One weighted constant-product pool, owned by the simulation layer.
///
/// Quoting reads the records; only [`PoolSimulator::commit`] mutates them.
#[derive(Debug, Clone)]
pub struct WeightedPool {
    info: PoolInfo,
    records: HashMap<String, TokenRecord>,
    public_swap: bool,
    swap_fee: BigUint,
    gas: Gas,
}

impl WeightedPool {
    /// Builds a pool from a state snapshot: an ordered list of token records,
    /// the pool-wide swap fee (fixed-point) and the public-swap flag.
    pub fn new(
        address: impl Into<String>,
        block_number: u64,
        tokens: Vec<(String, TokenRecord)>,
        public_swap: bool,
        swap_fee: BigUint,
    ) -> Self {
        let info = PoolInfo {
            address: address.into(),
            exchange: "weighted".to_string(),
            pool_type: "weighted-constant-product".to_string(),
            tokens: tokens.iter().map(|(t, _)| t.clone()).collect(),
            reserves: tokens.iter().map(|(_, r)| r.balance.clone()).collect(),
            block_number,
        };

        Self {
            info,
            records: tokens.into_iter().collect(),
            public_swap,
            swap_fee,
            gas: Gas::default(),
        }
    }

    pub fn record(&self, token: &str) -> Option<&TokenRecord> {
        self.records.get(token)
    }

    fn bound_record(&self, token: &str) -> Result<&TokenRecord, SimulatorError> {
        match self.records.get(token) {
            Some(record) if record.bound => Ok(record),
            _ => Err(SimulatorError::NotBound),
        }
    }

    /// Computes the output amount and post-trade spot price for an exact-in
    /// swap, without touching the pool's state.
    fn swap_exact_amount_in(
        &self,
        token_in: &str,
        amount_in: &BigUint,
        token_out: &str,
    ) -> Result<(BigUint, BigUint), SimulatorError> {
        let in_record = self.bound_record(token_in)?;
        let out_record = self.bound_record(token_out)?;

        if !self.public_swap {
            return Err(SimulatorError::SwapNotPublic);
        }

        let max_amount_in = mul(&in_record.balance, &MAX_IN_RATIO)?;
        if *amount_in > max_amount_in {
            return Err(SimulatorError::ExceedsMaxInputRatio);
        }

        let spot_price_before = calc_spot_price(
            &in_record.balance,
            &in_record.weight,
            &out_record.balance,
            &out_record.weight,
            &self.swap_fee,
        )?;

        let amount_out = calc_out_given_in(
            &in_record.balance,
            &in_record.weight,
            &out_record.balance,
            &out_record.weight,
            amount_in,
            &self.swap_fee,
        )?;

        // hypothetical post-trade balances; the records stay untouched
        let balance_in_after = add(&in_record.balance, amount_in)?;
        let balance_out_after = sub(&out_record.balance, &amount_out)?;

        let spot_price_after = calc_spot_price(
            &balance_in_after,
            &in_record.weight,
            &balance_out_after,
            &out_record.weight,
            &self.swap_fee,
        )?;

        // a paying trader must never see the price decrease
        if spot_price_after < spot_price_before {
            return Err(SimulatorError::MathApproximation);
        }

        // no-arbitrage sanity bound on the realized rate
        let realized_rate = div(amount_in, &amount_out)?;
        if spot_price_before > realized_rate {
            return Err(SimulatorError::MathApproximation);
        }

        Ok((amount_out, spot_price_after))
    }
}

impl PoolSimulator for WeightedPool {
    fn info(&self) -> &PoolInfo {
        &self.info
    }

    fn quote(
        &self,
        amount_in: &TokenAmount,
        token_out: &str,
    ) -> Result<QuoteResult, SimulatorError> {
        let (amount_out, spot_price_after) =
            self.swap_exact_amount_in(&amount_in.token, &amount_in.amount, token_out)?;

        Ok(QuoteResult {
            amount_out: TokenAmount::new(token_out, amount_out),
            fee: None,
            gas: self.gas.swap_exact_amount_in,
            swap_info: Some(json!({
                "spot_price_after": spot_price_after.to_string(),
            })),
        })
    }

    fn commit(&mut self, params: &CommitParams) {
        let token_in = &params.amount_in.token;
        let token_out = &params.amount_out.token;

        let (Some(in_record), Some(out_record)) =
            (self.records.get(token_in), self.records.get(token_out))
        else {
            tracing::warn!(
                pool = %self.info.address,
                "commit references tokens unknown to the pool"
            );
            return;
        };

        let new_balance_in = match add(&in_record.balance, &params.amount_in.amount) {
            Ok(balance) => balance,
            Err(err) => {
                tracing::warn!(pool = %self.info.address, %err, "failed to commit swap");
                return;
            }
        };

        let new_balance_out = match sub(&out_record.balance, &params.amount_out.amount) {
            Ok(balance) => balance,
            Err(err) => {
                tracing::warn!(pool = %self.info.address, %err, "failed to commit swap");
                return;
            }
        };

        if let Some(record) = self.records.get_mut(token_in) {
            record.balance = new_balance_in.clone();
        }
        if let Some(record) = self.records.get_mut(token_out) {
            record.balance = new_balance_out.clone();
        }

        // keep the reserve snapshot consistent with the records
        if let Some(index) = self.info.token_index(token_in) {
            self.info.reserves[index] = new_balance_in;
        }
        if let Some(index) = self.info.token_index(token_out) {
            self.info.reserves[index] = new_balance_out;
        }
    }
}
