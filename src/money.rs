//! Exact money arithmetic helpers.
//!
//! Inside the engine every amount is a `BigRational` counted in minor
//! currency units. Decimal text (ledger rows, config values) is converted
//! exactly on the way in; rationals are truncated toward zero exactly once
//! on the way out, when a report is rendered.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use rust_decimal::Decimal;

/// Errors converting a decimal currency amount into minor units.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AmountError {
    #[error("amount {0} is negative")]
    Negative(Decimal),

    #[error("amount {amount} is not a whole number of minor units (1/10^{decimals})")]
    SubUnit { amount: Decimal, decimals: u32 },

    #[error("amount {0} does not fit in 64 bits of minor units")]
    Overflow(Decimal),
}

/// 10^exp as a big integer.
pub fn pow10(exp: u32) -> BigInt {
    num_traits::pow(BigInt::from(10), exp as usize)
}

/// Exact rational value of a decimal.
pub fn ratio_from_decimal(value: Decimal) -> BigRational {
    BigRational::new(BigInt::from(value.mantissa()), pow10(value.scale()))
}

/// Scale a whole-unit decimal to minor units, exactly. The result may be
/// fractional (published outputs sometimes carry sub-unit digits).
pub fn to_minor_ratio(value: Decimal, decimals: u32) -> BigRational {
    ratio_from_decimal(value) * BigRational::from_integer(pow10(decimals))
}

/// Convert a whole-unit decimal into an integer count of minor units.
/// Fails if the amount carries digits below the smallest unit.
pub fn minor_units(value: Decimal, decimals: u32) -> Result<u64, AmountError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative(value));
    }
    let scaled = to_minor_ratio(value, decimals);
    if !scaled.is_integer() {
        return Err(AmountError::SubUnit { amount: value, decimals });
    }
    scaled
        .to_integer()
        .to_u64()
        .ok_or(AmountError::Overflow(value))
}

/// Truncate toward zero to a whole number of minor units. This is the
/// single rounding step, applied only to finalized payouts.
pub fn truncate_to_minor(value: &BigRational) -> BigInt {
    value.trunc().to_integer()
}

/// Render a rational as a decimal string with `places` fractional digits,
/// truncating toward zero.
pub fn format_ratio(value: &BigRational, places: u32) -> String {
    let scaled = (value.abs() * BigRational::from_integer(pow10(places)))
        .trunc()
        .to_integer();
    let digits = scaled.to_string();
    let sign = if value.is_negative() && !scaled.is_zero() { "-" } else { "" };
    if places == 0 {
        return format!("{sign}{digits}");
    }
    let places = places as usize;
    let padded = format!("{digits:0>width$}", width = places + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - places);
    format!("{sign}{int_part}.{frac_part}")
}

/// Render an integer count of minor units in whole units.
pub fn format_minor(units: &BigInt, decimals: u32) -> String {
    format_ratio(&BigRational::new(units.clone(), pow10(decimals)), decimals)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
