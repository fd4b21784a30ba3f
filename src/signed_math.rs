//! Signed 18-decimal fixed-point math with binary transcendental kernels
//!
//! Bonding curves with continuous exponents need `x^y` for arbitrary positive
//! `x`, which the unsigned library cannot provide (its `pow` base is pinned
//! near one unit). This module supplies the signed complement: `log2`, `exp2`,
//! `pow`, `mul` and `div` over [`BigInt`] values scaled by 10^18, faithful to
//! the 59.18 fixed-point contract libraries.
//!
//! The representable magnitude is bounded by [`MAX_SD59X18`] (2^255 - 1) and
//! [`MIN_SD59X18`] (-2^255); operations past those bounds fail explicitly.
//! Domain checks precede every transcendental operation.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, ToPrimitive, Zero};
use once_cell::sync::Lazy;

use crate::error::MathError;

/// The fixed-point unit, 10^18.
pub static UNIT: Lazy<BigInt> = Lazy::new(|| BigInt::from(10u64).pow(18));

static UNIT_SQUARED: Lazy<BigInt> = Lazy::new(|| &*UNIT * &*UNIT);
static HALF_UNIT: Lazy<BigInt> = Lazy::new(|| &*UNIT / 2);
static DOUBLE_UNIT: Lazy<BigInt> = Lazy::new(|| &*UNIT * 2);
static UNIT_MAGNITUDE: Lazy<BigUint> = Lazy::new(|| BigUint::from(10u64).pow(18));

/// Maximum representable value: 2^255 - 1.
pub static MAX_SD59X18: Lazy<BigInt> =
    Lazy::new(|| (BigInt::from(1) << 255u32) - 1);

/// Minimum representable value: -2^255. Its absolute value is not
/// representable, which is why `mul`/`div` reject it outright.
pub static MIN_SD59X18: Lazy<BigInt> = Lazy::new(|| -(BigInt::from(1) << 255u32));

/// Inputs above this fail `exp2`; 2^192 would not fit the internal format.
pub static EXP2_MAX_INPUT: Lazy<BigInt> =
    Lazy::new(|| BigInt::from(192u8) * &*UNIT - 1);

/// Inputs below this floor make `exp2` underflow to zero (a policy, not an
/// error): the true result would be smaller than half the last decimal.
pub static EXP2_MIN_INPUT: Lazy<BigInt> =
    Lazy::new(|| BigInt::from(-59_794_705_707_972_522_261i128));

/// Binary logarithm of a positive fixed-point value.
///
/// Inputs at or below zero fail `InputTooSmall`. Inputs below one unit are
/// inverted (`UNIT^2 / x`) and the output sign flipped. The integer part is
/// the most-significant set bit of `x / UNIT`, found by binary search over
/// powers of two; the fractional part is refined bit by bit through repeated
/// squaring, halving the refinement step until it is exhausted.
pub fn log2(x: &BigInt) -> Result<BigInt, MathError> {
    if !x.is_positive() {
        return Err(MathError::InputTooSmall);
    }

    let (mut value, sign) = if *x >= *UNIT {
        (x.clone(), 1)
    } else {
        (&*UNIT_SQUARED / x, -1)
    };

    let n = msb(&(&value / &*UNIT));
    let mut result = BigInt::from(n) * &*UNIT;

    value >>= n;
    if value == *UNIT {
        return Ok(result * sign);
    }

    let mut delta = HALF_UNIT.clone();
    while delta.is_positive() {
        value = (&value * &value) / &*UNIT;

        if value >= *DOUBLE_UNIT {
            result += &delta;
            value >>= 1u32;
        }

        delta >>= 1u32;
    }

    Ok(result * sign)
}

/// Position of the most-significant set bit, via binary search over 2^m.
fn msb(x: &BigInt) -> u64 {
    let mut lo = 0u64;
    let mut hi = 256u64;

    while hi - lo > 1 {
        let mid = (lo + hi) >> 1;
        if (BigInt::from(1) << mid) <= *x {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    lo
}

/// Multiplicative refinement ladder for the fractional bits of `exp2`, in
/// 192.64 binary fixed point: entry `k` is `2^(2^-(k+1))`.
const EXP2_LADDER: [u128; 64] = [
    0x16A09E667F3BCC909,
    0x1306FE0A31B7152DF,
    0x1172B83C7D517ADCE,
    0x10B5586CF9890F62A,
    0x1059B0D31585743AE,
    0x102C9A3E778060EE7,
    0x10163DA9FB33356D8,
    0x100B1AFA5ABCBED61,
    0x10058C86DA1C09EA2,
    0x1002C605E2E8CEC50,
    0x100162F3904051FA1,
    0x1000B175EFFDC76BA,
    0x100058BA01FB9F96D,
    0x10002C5CC37DA9492,
    0x1000162E525EE0547,
    0x10000B17255775C04,
    0x1000058B91B5BC9AE,
    0x100002C5C89D5EC6D,
    0x10000162E43F4F831,
    0x100000B1721BCFC9A,
    0x10000058B90CF1E6E,
    0x1000002C5C863B73F,
    0x100000162E430E5A2,
    0x1000000B172183551,
    0x100000058B90C0B49,
    0x10000002C5C8601CC,
    0x1000000162E42FFF0,
    0x10000000B17217FBB,
    0x1000000058B90BFCE,
    0x100000002C5C85FE3,
    0x10000000162E42FF1,
    0x100000000B17217F8,
    0x10000000058B90BFC,
    0x1000000002C5C85FE,
    0x100000000162E42FF,
    0x1000000000B17217F,
    0x100000000058B90C0,
    0x10000000002C5C860,
    0x1000000000162E430,
    0x10000000000B17218,
    0x1000000000058B90C,
    0x100000000002C5C86,
    0x10000000000162E43,
    0x100000000000B1721,
    0x10000000000058B91,
    0x1000000000002C5C8,
    0x100000000000162E4,
    0x1000000000000B172,
    0x100000000000058B9,
    0x10000000000002C5D,
    0x1000000000000162E,
    0x10000000000000B17,
    0x1000000000000058C,
    0x100000000000002C6,
    0x10000000000000163,
    0x100000000000000B1,
    0x10000000000000059,
    0x1000000000000002C,
    0x10000000000000016,
    0x1000000000000000B,
    0x10000000000000006,
    0x10000000000000003,
    0x10000000000000001,
    0x10000000000000001,
];

/// Binary exponential of a fixed-point value.
///
/// Inputs below [`EXP2_MIN_INPUT`] return zero; inputs above
/// [`EXP2_MAX_INPUT`] fail `InputTooBig`. Negative inputs in range evaluate
/// `exp2(-x)` and invert.
pub fn exp2(x: &BigInt) -> Result<BigInt, MathError> {
    if x.is_negative() {
        if *x < *EXP2_MIN_INPUT {
            return Ok(BigInt::zero());
        }

        let inverse = exp2(&-x)?;
        return Ok(&*UNIT_SQUARED / inverse);
    }

    if *x > *EXP2_MAX_INPUT {
        return Err(MathError::InputTooBig);
    }

    // Convert to the internal 192.64 binary format.
    let x_192x64 = ((x << 64u32) / &*UNIT).magnitude().clone();

    Ok(BigInt::from_biguint(Sign::Plus, exp2_192x64(&x_192x64)))
}

/// Core `exp2` over the 192.64 format: start from 0.5, multiply in a ladder
/// constant for each set fractional bit, then rescale by the integer part.
fn exp2_192x64(x: &BigUint) -> BigUint {
    let mut result = BigUint::from(1u8) << 191u32;

    for (k, coefficient) in EXP2_LADDER.into_iter().enumerate() {
        if x.bit(63 - k as u64) {
            result = (result * coefficient) >> 64u32;
        }
    }

    result *= &*UNIT_MAGNITUDE;

    let integer_part = (x >> 64u32).to_u64().unwrap_or(0);
    result >> (191 - integer_part) as u32
}

/// Raises a positive fixed-point value to a fixed-point power via
/// `exp2(log2(x) * y)`, with direct shortcuts for the trivial cases.
pub fn pow(x: &BigInt, y: &BigInt) -> Result<BigInt, MathError> {
    if x.is_zero() {
        return Ok(if y.is_zero() { UNIT.clone() } else { BigInt::zero() });
    }

    if *x == *UNIT || y.is_zero() {
        return Ok(UNIT.clone());
    }

    if *y == *UNIT {
        return Ok(x.clone());
    }

    let log = log2(x)?;
    exp2(&mul(&log, y)?)
}

/// Fixed-point multiplication on magnitudes, sign reapplied afterwards.
pub fn mul(x: &BigInt, y: &BigInt) -> Result<BigInt, MathError> {
    if *x == *MIN_SD59X18 || *y == *MIN_SD59X18 {
        return Err(MathError::InputTooSmall);
    }

    let magnitude = (x.magnitude() * y.magnitude()) / &*UNIT_MAGNITUDE;
    apply_sign(magnitude, x, y)
}

/// Fixed-point division on magnitudes, sign reapplied afterwards.
pub fn div(x: &BigInt, y: &BigInt) -> Result<BigInt, MathError> {
    if *x == *MIN_SD59X18 || *y == *MIN_SD59X18 {
        return Err(MathError::InputTooSmall);
    }

    if y.is_zero() {
        return Err(MathError::DivideByZero);
    }

    let magnitude = (x.magnitude() * &*UNIT_MAGNITUDE) / y.magnitude();
    apply_sign(magnitude, x, y)
}

fn apply_sign(magnitude: BigUint, x: &BigInt, y: &BigInt) -> Result<BigInt, MathError> {
    if magnitude > *MAX_SD59X18.magnitude() {
        return Err(MathError::Overflow);
    }

    let same_sign = x.sign() == y.sign();
    let result = BigInt::from_biguint(Sign::Plus, magnitude);

    Ok(if same_sign { result } else { -result })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sfp(v: &str) -> BigInt {
        v.parse().expect("valid decimal literal")
    }

    #[test]
    fn test_log2_exact_values() {
        assert_eq!(log2(&UNIT).unwrap(), BigInt::zero());
        assert_eq!(log2(&sfp("2000000000000000000")).unwrap(), *UNIT);
        assert_eq!(
            log2(&sfp("4000000000000000000")).unwrap(),
            sfp("2000000000000000000")
        );
        // log2(0.5) = -1
        assert_eq!(log2(&sfp("500000000000000000")).unwrap(), -UNIT.clone());
    }

    #[test]
    fn test_log2_domain() {
        assert_eq!(log2(&BigInt::zero()), Err(MathError::InputTooSmall));
        assert_eq!(log2(&sfp("-1000000000000000000")), Err(MathError::InputTooSmall));
    }

    #[test]
    fn test_exp2_exact_values() {
        assert_eq!(exp2(&BigInt::zero()).unwrap(), *UNIT);
        assert_eq!(
            exp2(&sfp("1000000000000000000")).unwrap(),
            sfp("2000000000000000000")
        );
        assert_eq!(
            exp2(&sfp("3000000000000000000")).unwrap(),
            sfp("8000000000000000000")
        );
        // exp2(-1) = 0.5
        assert_eq!(
            exp2(&sfp("-1000000000000000000")).unwrap(),
            sfp("500000000000000000")
        );
    }

    #[test]
    fn test_exp2_range_policy() {
        // below the floor: underflow to zero, not an error
        let deep_negative = sfp("-60000000000000000000");
        assert_eq!(exp2(&deep_negative).unwrap(), BigInt::zero());

        let too_big = &*EXP2_MAX_INPUT + 1;
        assert_eq!(exp2(&too_big), Err(MathError::InputTooBig));
    }

    #[test]
    fn test_exp2_fractional_bits() {
        // exp2(0.5) = sqrt(2) within the ladder's precision
        let result = exp2(&sfp("500000000000000000")).unwrap();
        let expected = sfp("1414213562373095048");
        let diff = (&result - &expected).abs();
        assert!(diff < sfp("1000"), "diff = {diff}");
    }

    #[test]
    fn test_pow_shortcuts() {
        let x = sfp("3000000000000000000");
        assert_eq!(pow(&x, &BigInt::zero()).unwrap(), *UNIT);
        assert_eq!(pow(&x, &UNIT).unwrap(), x);
        assert_eq!(pow(&BigInt::zero(), &BigInt::zero()).unwrap(), *UNIT);
        assert_eq!(pow(&BigInt::zero(), &x).unwrap(), BigInt::zero());
        assert_eq!(pow(&UNIT, &x).unwrap(), *UNIT);
    }

    #[test]
    fn test_pow_square_root_of_four() {
        // 4^0.5 passes through exactly representable intermediates:
        // log2(4) = 2, 2 * 0.5 = 1, exp2(1) = 2
        let four = sfp("4000000000000000000");
        let half = sfp("500000000000000000");
        assert_eq!(pow(&four, &half).unwrap(), sfp("2000000000000000000"));
    }

    #[test]
    fn test_mul_signs_and_bounds() {
        let two = sfp("2000000000000000000");
        let minus_three = sfp("-3000000000000000000");

        assert_eq!(mul(&two, &minus_three).unwrap(), sfp("-6000000000000000000"));
        assert_eq!(mul(&minus_three, &minus_three).unwrap(), sfp("9000000000000000000"));

        assert_eq!(mul(&MIN_SD59X18, &two), Err(MathError::InputTooSmall));

        // magnitudes past 2^255 - 1 overflow
        let huge = MAX_SD59X18.clone();
        assert_eq!(mul(&huge, &huge), Err(MathError::Overflow));
    }

    #[test]
    fn test_div_signs_and_zero() {
        let six = sfp("6000000000000000000");
        let minus_two = sfp("-2000000000000000000");

        assert_eq!(div(&six, &minus_two).unwrap(), sfp("-3000000000000000000"));
        assert_eq!(div(&six, &BigInt::zero()), Err(MathError::DivideByZero));
        assert_eq!(div(&MIN_SD59X18, &six), Err(MathError::InputTooSmall));
    }
}
