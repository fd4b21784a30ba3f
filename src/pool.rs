//! Pool simulator contract and shared quoting plumbing
//!
//! Every pool variant implements [`PoolSimulator`]: a pure, deterministic
//! `quote`, a state-mutating `commit`, and the introspection surface a router
//! needs to build its graph. The module also provides the two pieces shared
//! by all variants: the fault-containment boundary ([`quote_guarded`]) and
//! the approximate inverse quote ([`quote_exact_output`]).

use std::panic::{self, AssertUnwindSafe};

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{MathError, SimulatorError};

/// An amount of a specific token, in the token's smallest units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount {
    pub token: String,
    pub amount: BigUint,
}

impl TokenAmount {
    pub fn new(token: impl Into<String>, amount: BigUint) -> Self {
        Self { token: token.into(), amount }
    }
}

/// Immutable result of a forward quote.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteResult {
    pub amount_out: TokenAmount,
    pub fee: Option<TokenAmount>,
    pub gas: u64,
    /// Opaque routing metadata attached by the pool variant.
    pub swap_info: Option<serde_json::Value>,
}

impl QuoteResult {
    /// A quote is only usable by the router if it produces a positive output.
    pub fn is_valid(&self) -> bool {
        !self.amount_out.amount.is_zero()
    }
}

/// Result of an inverse quote: the estimated input for a target output.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountInResult {
    pub amount_in: TokenAmount,
    pub fee: Option<TokenAmount>,
    pub gas: u64,
}

/// Delta of a completed swap, fed back into the pool through `commit`.
#[derive(Debug, Clone)]
pub struct CommitParams {
    pub amount_in: TokenAmount,
    pub amount_out: TokenAmount,
    pub fee: Option<TokenAmount>,
}

/// Static description of a pool instance.
#[derive(Debug, Clone, Default)]
pub struct PoolInfo {
    pub address: String,
    pub exchange: String,
    pub pool_type: String,
    pub tokens: Vec<String>,
    pub reserves: Vec<BigUint>,
    pub block_number: u64,
}

impl PoolInfo {
    pub fn token_index(&self, token: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t == token)
    }
}

/// Routing metadata a pool exposes alongside its quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMeta {
    pub block_number: u64,
}

/// Gas estimates per simulated operation.
#[derive(Debug, Clone, Copy)]
pub struct Gas {
    pub swap_exact_amount_in: u64,
}

impl Default for Gas {
    fn default() -> Self {
        // cost of one exact-in swap against a weighted pool
        Self { swap_exact_amount_in: 100_000 }
    }
}

/// Capability interface every pool variant exposes to the router.
///
/// `quote` is a pure function of current state: deterministic, side-effect
/// free, safe to call concurrently across instances. `commit` performs a
/// non-atomic read-modify-write and must be serialized per instance by the
/// caller (it takes `&mut self`, so the borrow checker enforces this within
/// one thread of ownership).
pub trait PoolSimulator: Send + Sync {
    fn info(&self) -> &PoolInfo;

    fn tokens(&self) -> &[String] {
        &self.info().tokens
    }

    fn reserves(&self) -> &[BigUint] {
        &self.info().reserves
    }

    fn address(&self) -> &str {
        &self.info().address
    }

    /// Tokens reachable from `token` in one swap. Pools are bi-directional
    /// by default; variants with custom routing override this.
    fn can_swap_to(&self, token: &str) -> Vec<String> {
        let info = self.info();
        match info.token_index(token) {
            Some(index) => info
                .tokens
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, t)| t.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    fn can_swap_from(&self, token: &str) -> Vec<String> {
        self.can_swap_to(token)
    }

    /// Quotes the output of swapping `amount_in` into `token_out` against the
    /// pool's current state. Never mutates balances.
    fn quote(
        &self,
        amount_in: &TokenAmount,
        token_out: &str,
    ) -> Result<QuoteResult, SimulatorError>;

    /// Applies a completed swap's delta to the pool's own record. Failures
    /// are logged and leave the state unchanged rather than propagate.
    fn commit(&mut self, params: &CommitParams);

    fn meta_info(&self) -> PoolMeta {
        PoolMeta { block_number: self.info().block_number }
    }
}

/// Quotes through the fault-containment boundary.
///
/// Any unexpected runtime fault raised inside the simulator, at any call
/// depth, is converted into [`SimulatorError::RuntimeFault`] so one
/// malformed pool cannot abort the evaluation of a batch spanning many pools.
pub fn quote_guarded(
    pool: &dyn PoolSimulator,
    amount_in: &TokenAmount,
    token_out: &str,
) -> Result<QuoteResult, SimulatorError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pool.quote(amount_in, token_out)));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(pool = %pool.address(), %message, "quote panicked");
            Err(SimulatorError::RuntimeFault { message })
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Estimates the input amount needed to receive `amount_out` of its token.
///
/// The swap curve is not generally invertible in closed form, so the input is
/// approximated with two forward quotes: the reverse direction is quoted with
/// the desired output treated as an input, yielding an intermediate amount
/// `k`; quoting forward from `k` shows what it would actually produce; the
/// estimate is then `amount_out * k / actual`. This relies on local linearity
/// between the two probe points and degrades in highly curved regions.
pub fn quote_exact_output(
    pool: &dyn PoolSimulator,
    amount_out: &TokenAmount,
    token_in: &str,
) -> Result<AmountInResult, SimulatorError> {
    let reverse = pool.quote(amount_out, token_in)?;
    let k = reverse.amount_out;

    let forward = pool.quote(&k, &amount_out.token)?;
    let actual = forward.amount_out.amount;

    if actual.is_zero() {
        return Err(MathError::DivideByZero.into());
    }

    let amount_in = &amount_out.amount * &k.amount / actual;

    Ok(AmountInResult {
        amount_in: TokenAmount::new(token_in, amount_in),
        fee: None,
        gas: forward.gas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingPool {
        info: PoolInfo,
    }

    impl PanickingPool {
        fn new() -> Self {
            Self {
                info: PoolInfo {
                    address: "0xdead".to_string(),
                    exchange: "test".to_string(),
                    pool_type: "panicking".to_string(),
                    tokens: vec!["a".to_string(), "b".to_string()],
                    reserves: vec![BigUint::zero(), BigUint::zero()],
                    block_number: 1,
                },
            }
        }
    }

    impl PoolSimulator for PanickingPool {
        fn info(&self) -> &PoolInfo {
            &self.info
        }

        fn quote(
            &self,
            _amount_in: &TokenAmount,
            _token_out: &str,
        ) -> Result<QuoteResult, SimulatorError> {
            // simulate an invariant violation deep inside dense arithmetic
            let empty: Vec<u8> = Vec::new();
            let _ = empty[3];
            unreachable!()
        }

        fn commit(&mut self, _params: &CommitParams) {}
    }

    #[test]
    fn test_guarded_quote_contains_panic() {
        let pool = PanickingPool::new();
        let amount_in = TokenAmount::new("a", BigUint::from(1u8));

        let err = quote_guarded(&pool, &amount_in, "b").unwrap_err();

        match err {
            SimulatorError::RuntimeFault { message } => {
                assert!(!message.is_empty());
            }
            other => panic!("expected RuntimeFault, got {other:?}"),
        }
    }

    #[test]
    fn test_can_swap_to_excludes_self_and_unknown() {
        let pool = PanickingPool::new();

        assert_eq!(pool.can_swap_to("a"), vec!["b".to_string()]);
        assert_eq!(pool.can_swap_from("b"), vec!["a".to_string()]);
        assert!(pool.can_swap_to("c").is_empty());
    }

    #[test]
    fn test_meta_info_reports_block_number() {
        let pool = PanickingPool::new();
        assert_eq!(pool.meta_info(), PoolMeta { block_number: 1 });
    }
}
