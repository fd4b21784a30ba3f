//! Error types for fixed-point arithmetic and pool simulation
//!
//! Two layers: [`MathError`] for failures inside the arithmetic libraries,
//! and [`SimulatorError`] for everything a router can see from a pool:
//! precondition violations, inventory misuse, and contained runtime faults.

use thiserror::Error;

/// Errors raised by the checked fixed-point arithmetic.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// Division with a zero divisor
    #[error("division by zero")]
    DivideByZero,

    /// Result would exceed the maximum representable magnitude
    #[error("arithmetic overflow")]
    Overflow,

    /// Subtraction would produce a negative unsigned value
    #[error("subtraction underflow")]
    Underflow,

    /// `pow` base below the minimum of the valid interval around one unit
    #[error("pow base below minimum")]
    BaseTooLow,

    /// `pow` base above the maximum of the valid interval around one unit
    #[error("pow base above maximum")]
    BaseTooHigh,

    /// Signed-domain input outside the representable range (too small)
    #[error("input too small for signed fixed-point operation")]
    InputTooSmall,

    /// Signed-domain input outside the representable range (too big)
    #[error("input too big for signed fixed-point operation")]
    InputTooBig,
}

/// Errors surfaced to the router from `quote`, `quote_exact_output` and the
/// inventory ledger.
///
/// A router receiving one of these excludes the pool (or hop) from the current
/// candidate set and keeps going; nothing here is retryable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulatorError {
    /// Arithmetic failure inside the swap curve evaluation
    #[error(transparent)]
    Math(#[from] MathError),

    /// One of the swap tokens is not bound to the pool
    #[error("token is not bound to the pool")]
    NotBound,

    /// The pool's public-swap flag is not set
    #[error("pool is not enabled for public swaps")]
    SwapNotPublic,

    /// Input amount exceeds the per-trade cap relative to the input balance
    #[error("input amount exceeds the max input ratio")]
    ExceedsMaxInputRatio,

    /// Rounding produced an economically inconsistent quote
    #[error("math approximation produced an inconsistent price")]
    MathApproximation,

    /// The inventory does not track the named token
    #[error("token {token} is not tracked by the inventory")]
    TokenNotTracked { token: String },

    /// The inventory balance cannot cover the requested decrease
    #[error("insufficient inventory balance for token {token}")]
    InsufficientBalance { token: String },

    /// An unexpected runtime fault inside a quoting call, converted to a
    /// regular error at the containment boundary
    #[error("quote raised an unexpected fault: {message}")]
    RuntimeFault { message: String },
}
