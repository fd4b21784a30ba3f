//! Unsigned 18-decimal fixed-point arithmetic
//!
//! Replicates, value for value, the checked decimal math used by weighted
//! constant-product pool contracts: round-to-nearest `mul`/`div`,
//! exponentiation by squaring for integer exponents, and a truncated binomial
//! series for fractional exponents.
//!
//! Values are [`BigUint`]s scaled by [`ONE`] = 10^18. Every operation takes
//! its operands by reference and returns a fresh value or a typed error;
//! nothing is mutated in place.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use once_cell::sync::Lazy;

use crate::error::MathError;

/// The fixed-point scale factor: 10^18 represents the value 1.0.
pub static ONE: Lazy<BigUint> = Lazy::new(|| BigUint::from(10u64).pow(18));

/// Lower bound of the valid `pow` base interval.
pub static MIN_POW_BASE: Lazy<BigUint> = Lazy::new(BigUint::one);

/// Upper bound of the valid `pow` base interval: 2.0 - 1 wei.
pub static MAX_POW_BASE: Lazy<BigUint> =
    Lazy::new(|| BigUint::from(2u8) * &*ONE - BigUint::one());

/// Series cutoff for `pow_approx`: terms below 10^-10 are dropped.
pub static POW_PRECISION: Lazy<BigUint> =
    Lazy::new(|| &*ONE / BigUint::from(10u64).pow(10));

/// Truncates a fixed-point value to its integer part (unscaled).
pub fn to_int(a: &BigUint) -> BigUint {
    a / &*ONE
}

/// Rounds a fixed-point value down to a whole number of units.
pub fn floor(a: &BigUint) -> BigUint {
    to_int(a) * &*ONE
}

/// Checked addition.
pub fn add(a: &BigUint, b: &BigUint) -> Result<BigUint, MathError> {
    let c = a + b;

    // Wrap check carried over from the 256-bit contract math; it cannot trip
    // on big integers but keeps the failure surface identical.
    if c < *a {
        return Err(MathError::Overflow);
    }

    Ok(c)
}

/// Checked subtraction; only non-negative magnitudes are representable.
pub fn sub(a: &BigUint, b: &BigUint) -> Result<BigUint, MathError> {
    let (c, negative) = sub_sign(a, b);

    if negative {
        return Err(MathError::Underflow);
    }

    Ok(c)
}

/// Subtraction as a magnitude plus an explicit sign flag.
pub fn sub_sign(a: &BigUint, b: &BigUint) -> (BigUint, bool) {
    if a >= b {
        (a - b, false)
    } else {
        (b - a, true)
    }
}

/// Fixed-point multiplication, rounded to nearest.
pub fn mul(a: &BigUint, b: &BigUint) -> Result<BigUint, MathError> {
    let c0 = a * b;

    if !a.is_zero() && &c0 / a != *b {
        return Err(MathError::Overflow);
    }

    let c1 = &c0 + (&*ONE >> 1);

    if c1 < c0 {
        return Err(MathError::Overflow);
    }

    Ok(c1 / &*ONE)
}

/// Fixed-point division, rounded to nearest.
pub fn div(a: &BigUint, b: &BigUint) -> Result<BigUint, MathError> {
    if b.is_zero() {
        return Err(MathError::DivideByZero);
    }

    let c0 = a * &*ONE;

    if !a.is_zero() && &c0 / a != *ONE {
        return Err(MathError::Overflow);
    }

    let c1 = &c0 + (b >> 1);

    if c1 < c0 {
        return Err(MathError::Overflow);
    }

    Ok(c1 / b)
}

/// Raises a fixed-point base to a non-negative integer exponent
/// (exponentiation by squaring). `n` is unscaled.
pub fn pow_int(a: &BigUint, n: &BigUint) -> Result<BigUint, MathError> {
    let mut a = a.clone();
    let mut n = n.clone();
    let mut z = if n.bit(0) { a.clone() } else { ONE.clone() };

    n >>= 1;
    while !n.is_zero() {
        a = mul(&a, &a)?;

        if n.bit(0) {
            z = mul(&z, &a)?;
        }

        n >>= 1;
    }

    Ok(z)
}

/// Raises a fixed-point base to a fixed-point exponent.
///
/// The base must lie in `[MIN_POW_BASE, MAX_POW_BASE]`. The exponent is split
/// into its integer floor (handled by [`pow_int`]) and fractional remainder
/// (handled by [`pow_approx`]); the two partial results are combined with a
/// rounded multiply.
pub fn pow(base: &BigUint, exp: &BigUint) -> Result<BigUint, MathError> {
    if *base < *MIN_POW_BASE {
        return Err(MathError::BaseTooLow);
    }

    if *base > *MAX_POW_BASE {
        return Err(MathError::BaseTooHigh);
    }

    let whole = floor(exp);
    let remain = sub(exp, &whole)?;

    let whole_pow = pow_int(base, &to_int(&whole))?;

    if remain.is_zero() {
        return Ok(whole_pow);
    }

    let partial = pow_approx(base, &remain, &POW_PRECISION)?;

    mul(&whole_pow, &partial)
}

/// Evaluates `base^exp` for `0 <= exp < 1` as the alternating binomial series
/// of `(1 + x)^exp` with `x = base - ONE`.
///
/// Terms are built incrementally; the sign of each term flips independently
/// on the sign of `x` and the sign of the running binomial coefficient, both
/// tracked explicitly. The loop stops once a term's magnitude drops below
/// `precision`, and immediately when a term reaches exactly zero.
pub fn pow_approx(
    base: &BigUint,
    exp: &BigUint,
    precision: &BigUint,
) -> Result<BigUint, MathError> {
    let (x, x_neg) = sub_sign(base, &ONE);
    let mut term = ONE.clone();
    let mut sum = term.clone();
    let mut negative = false;

    let mut i = BigUint::one();
    while term >= *precision {
        let big_k = &i * &*ONE;

        let (c, c_neg) = sub_sign(exp, &sub(&big_k, &ONE)?);

        term = mul(&term, &mul(&c, &x)?)?;
        term = div(&term, &big_k)?;

        if term.is_zero() {
            break;
        }

        if x_neg {
            negative = !negative;
        }

        if c_neg {
            negative = !negative;
        }

        if negative {
            sum = sub(&sum, &term)?;
        } else {
            sum = add(&sum, &term)?;
        }

        i += 1u8;
    }

    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fp(v: &str) -> BigUint {
        v.parse().expect("valid decimal literal")
    }

    #[test]
    fn test_mul_rounds_to_nearest() {
        // 1.5 * 1.5 = 2.25
        let a = fp("1500000000000000000");
        assert_eq!(mul(&a, &a).unwrap(), fp("2250000000000000000"));

        // rounding: 1e-18 * 0.5 rounds to 1e-18
        let tiny = BigUint::one();
        let half = fp("500000000000000000");
        assert_eq!(mul(&tiny, &half).unwrap(), BigUint::one());
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(
            div(&ONE, &BigUint::zero()),
            Err(MathError::DivideByZero)
        );
    }

    #[test]
    fn test_sub_underflow() {
        let a = fp("1");
        let b = fp("2");
        assert_eq!(sub(&a, &b), Err(MathError::Underflow));
        assert_eq!(sub(&b, &a).unwrap(), BigUint::one());
    }

    #[test]
    fn test_pow_int_identities() {
        let a = fp("3141592653589793238");
        assert_eq!(pow_int(&a, &BigUint::zero()).unwrap(), *ONE);
        assert_eq!(pow_int(&a, &BigUint::one()).unwrap(), a);

        // 1.5^2 = 2.25
        let b = fp("1500000000000000000");
        assert_eq!(
            pow_int(&b, &BigUint::from(2u8)).unwrap(),
            fp("2250000000000000000")
        );
    }

    #[test]
    fn test_pow_base_bounds() {
        let exp = fp("500000000000000000");
        assert_eq!(pow(&BigUint::zero(), &exp), Err(MathError::BaseTooLow));

        let too_high = &*MAX_POW_BASE + BigUint::one();
        assert_eq!(pow(&too_high, &exp), Err(MathError::BaseTooHigh));
    }

    #[test]
    fn test_pow_of_one_is_one() {
        for exp in ["1", "500000000000000000", "1000000000000000000", "2718281828459045235"] {
            assert_eq!(pow(&ONE, &fp(exp)).unwrap(), *ONE, "exp = {exp}");
        }
    }

    #[test]
    fn test_pow_fractional_square_root() {
        // 1.21^0.5 = 1.1 up to series precision
        let base = fp("1210000000000000000");
        let half = fp("500000000000000000");
        let result = pow(&base, &half).unwrap();

        let expected = fp("1100000000000000000");
        let (diff, _) = sub_sign(&result, &expected);
        assert!(diff < fp("100000000"), "diff = {diff}");
    }

    #[test]
    fn test_pow_approx_terminates_on_zero_term() {
        // base == ONE makes x == 0; the first term is exactly zero
        let result = pow_approx(&ONE, &fp("700000000000000000"), &POW_PRECISION).unwrap();
        assert_eq!(result, *ONE);
    }

    proptest! {
        #[test]
        fn prop_mul_div_round_trip(a in 1u128..) {
            let a = BigUint::from(a);
            let wrapped = mul(&a, &ONE).unwrap();
            prop_assert_eq!(&wrapped, &a);
            prop_assert_eq!(div(&wrapped, &a).unwrap(), ONE.clone());
        }

        #[test]
        fn prop_add_sub_inverse(a in 0u128.., b in 0u128..) {
            let a = BigUint::from(a);
            let b = BigUint::from(b);
            let sum = add(&a, &b).unwrap();
            prop_assert_eq!(sub(&sum, &b).unwrap(), a);
        }
    }
}
