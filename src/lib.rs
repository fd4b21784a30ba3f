//! # AMM Simulation Library - Deterministic Pool Mathematics Engine
//!
//! ## Purpose
//!
//! Off-chain simulation of weighted constant-product AMM pools that reproduces
//! on-chain fixed-point arithmetic bit for bit. Quotes computed here match what
//! the chain would settle, including the contract's round-to-nearest behavior
//! and series-based fractional exponentiation, making the crate suitable for
//! routing, arbitrage detection and pre-trade validation.
//!
//! ## Architecture Role
//!
//! - [`fixed_point`]: unsigned 18-decimal fixed-point arithmetic with
//!   round-to-nearest multiply/divide and binomial-series fractional powers
//! - [`signed_math`]: signed 59.18 fixed-point `log2`/`exp2`/`pow` built on a
//!   binary 192.64 internal representation
//! - [`pool`]: the [`PoolSimulator`] trait, quote/commit data types, the
//!   fault-contained quoting wrapper and the approximate inverse quote
//! - [`weighted`]: the weighted constant-product pool implementation
//! - [`inventory`]: thread-safe token balance tracking for the routing layer
//!
//! ## Invariants
//!
//! - **Quoting is pure**: [`PoolSimulator::quote`] never mutates pool state;
//!   observed fills are applied separately through [`PoolSimulator::commit`]
//! - **Determinism**: identical inputs produce identical outputs on every
//!   platform; no floating point anywhere in the quote path
//! - **Fault containment**: a panicking simulator is caught by
//!   [`pool::quote_guarded`] and surfaced as a typed error

pub mod error;
pub mod fixed_point;
pub mod inventory;
pub mod pool;
pub mod signed_math;
pub mod weighted;

pub use error::{MathError, SimulatorError};
pub use inventory::Inventory;
pub use pool::{
    quote_exact_output, quote_guarded, AmountInResult, CommitParams, Gas, PoolInfo,
    PoolSimulator, QuoteResult, TokenAmount,
};
pub use weighted::{calc_out_given_in, calc_spot_price, TokenRecord, WeightedPool};
