//! Fixed-point arithmetic and mathematical utilities.
//!
//! Assets come in different precisions (6, 8, 18 decimals). Everything the
//! vault compares or sums is first normalised into one 18-decimal USD value
//! unit. Products are formed in 256 bits so `amount * price` cannot overflow
//! before the division brings it back into range.

use crate::error::{Error, Result};
use crate::utils::constants::{BPS_DIVISOR, MAX_ASSET_DECIMALS, SCALE, VALUE_DECIMALS};
use ethnum::U256;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// FIXED POINT TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed-point fraction with 18 decimal places (1.0 = 10^18).
/// Used for ratios such as the vault buffer and the supply drift limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct FixedPoint(u128);

impl FixedPoint {
    /// Scale factor: 10^18
    pub const SCALE: u128 = SCALE;

    /// Zero value
    pub const ZERO: Self = Self(0);

    /// One (1.0)
    pub const ONE: Self = Self(Self::SCALE);

    /// Create a new FixedPoint from raw value
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Create from basis points (100 bps = 1%)
    pub fn from_bps(bps: u128) -> Self {
        Self(bps.saturating_mul(Self::SCALE) / BPS_DIVISOR)
    }

    /// Get the raw underlying value
    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `value * self`, rounded down
    pub fn apply(&self, value: u128) -> Result<u128> {
        mul_div(value, self.0, Self::SCALE)
    }

    /// Ratio `numerator / denominator` as a fraction, rounded down
    pub fn ratio(numerator: u128, denominator: u128) -> Result<Self> {
        mul_div(numerator, Self::SCALE, denominator).map(Self)
    }

    /// Percentage with two decimals, e.g. `10.00%`
    pub fn to_percent_string(&self) -> String {
        let basis = self.0 / (Self::SCALE / 10_000);
        format!("{}.{:02}%", basis / 100, basis % 100)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_units(self.0, VALUE_DECIMALS))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIDE ARITHMETIC
// ═══════════════════════════════════════════════════════════════════════════════

fn narrow(value: U256, operation: &str) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(Error::Overflow {
            operation: operation.to_string(),
        });
    }
    Ok(value.as_u128())
}

/// `a * b / denominator`, rounded down, 256-bit intermediate
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(Error::InvalidParameter {
            name: "denominator".into(),
            reason: "division by zero".into(),
        });
    }
    let product = U256::from(a) * U256::from(b);
    narrow(product / U256::from(denominator), "mul_div")
}

/// `a * b / denominator`, rounded up, 256-bit intermediate
pub fn mul_div_up(a: u128, b: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(Error::InvalidParameter {
            name: "denominator".into(),
            reason: "division by zero".into(),
        });
    }
    let product = U256::from(a) * U256::from(b);
    let d = U256::from(denominator);
    let mut quotient = product / d;
    if product % d != U256::ZERO {
        quotient += U256::ONE;
    }
    narrow(quotient, "mul_div_up")
}

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or_else(|| Error::Overflow {
        operation: format!("{} + {}", a, b),
    })
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or_else(|| Error::Underflow {
        operation: format!("{} - {}", a, b),
    })
}

/// `amount * bps / 10000`, rounded down
pub fn bps_of(amount: u128, bps: u128) -> Result<u128> {
    mul_div(amount, bps, BPS_DIVISOR)
}

/// `10^decimals`
pub fn pow10(decimals: u8) -> Result<u128> {
    if decimals > MAX_ASSET_DECIMALS {
        return Err(Error::InvalidParameter {
            name: "decimals".into(),
            reason: format!("{} exceeds maximum {}", decimals, MAX_ASSET_DECIMALS),
        });
    }
    Ok(10u128.pow(decimals as u32))
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECIMAL NORMALISATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Scale a native amount into the 18-decimal unit.
/// Scaling down truncates; scaling up fails on overflow.
pub fn to_units(amount: u128, from_decimals: u8) -> Result<u128> {
    if from_decimals == VALUE_DECIMALS {
        return Ok(amount);
    }
    if from_decimals < VALUE_DECIMALS {
        let factor = pow10(VALUE_DECIMALS - from_decimals)?;
        return amount.checked_mul(factor).ok_or_else(|| Error::Overflow {
            operation: format!("to_units({}, {})", amount, from_decimals),
        });
    }
    Ok(amount / pow10(from_decimals - VALUE_DECIMALS)?)
}

/// Scale an 18-decimal value back into native units, truncating
pub fn from_units(value: u128, to_decimals: u8) -> Result<u128> {
    if to_decimals == VALUE_DECIMALS {
        return Ok(value);
    }
    if to_decimals < VALUE_DECIMALS {
        return Ok(value / pow10(VALUE_DECIMALS - to_decimals)?);
    }
    let factor = pow10(to_decimals - VALUE_DECIMALS)?;
    value.checked_mul(factor).ok_or_else(|| Error::Overflow {
        operation: format!("from_units({}, {})", value, to_decimals),
    })
}

/// USD value (18 decimals) of `amount` native units at `price` (18 decimals).
/// `amount * price / 10^decimals`, rounded down.
pub fn apply_price(amount: u128, decimals: u8, price: u128) -> Result<u128> {
    mul_div(amount, price, pow10(decimals)?)
}

/// Native units worth `value` at `price`, rounded down
pub fn value_to_amount(value: u128, decimals: u8, price: u128) -> Result<u128> {
    mul_div(value, pow10(decimals)?, price)
}

/// Render a fixed-point integer with its decimals, trailing zeros trimmed
pub fn format_units(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let factor = 10u128.pow(decimals.min(MAX_ASSET_DECIMALS) as u32);
    let whole = amount / factor;
    let frac = amount % factor;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: u128 = SCALE;

    #[test]
    fn test_fixed_point_basic() {
        let tenth = FixedPoint::from_raw(E18 / 10);
        assert_eq!(tenth.apply(222 * E18).unwrap(), 22_200_000_000_000_000_000);
        assert_eq!(FixedPoint::ONE.apply(5).unwrap(), 5);
        assert!(FixedPoint::ZERO.is_zero());
    }

    #[test]
    fn test_fixed_point_from_bps() {
        assert_eq!(FixedPoint::from_bps(5000), FixedPoint::from_raw(E18 / 2));
        assert_eq!(FixedPoint::from_bps(1000).to_percent_string(), "10.00%");
        assert_eq!(FixedPoint::ONE.to_percent_string(), "100.00%");
    }

    #[test]
    fn test_ratio() {
        assert_eq!(FixedPoint::ratio(1, 4).unwrap(), FixedPoint::from_raw(E18 / 4));
        assert!(FixedPoint::ratio(1, 0).is_err());
    }

    #[test]
    fn test_mul_div_wide() {
        // Intermediate exceeds u128 but the result does not
        assert_eq!(mul_div(u128::MAX, 4, 8).unwrap(), u128::MAX / 2);
        assert!(mul_div(u128::MAX, 2, 1).is_err());
        assert!(mul_div(1, 1, 0).is_err());
    }

    #[test]
    fn test_mul_div_up() {
        assert_eq!(mul_div_up(10, 1, 3).unwrap(), 4);
        assert_eq!(mul_div_up(9, 1, 3).unwrap(), 3);
        assert_eq!(mul_div(10, 1, 3).unwrap(), 3);
    }

    #[test]
    fn test_safe_arithmetic() {
        assert!(safe_add(1, 2).is_ok());
        assert!(safe_add(u128::MAX, 1).is_err());
        assert!(safe_sub(5, 3).is_ok());
        assert!(matches!(safe_sub(3, 5), Err(Error::Underflow { .. })));
    }

    #[test]
    fn test_to_units() {
        assert_eq!(to_units(1_000_000, 6).unwrap(), E18);
        assert_eq!(to_units(100_000_000, 8).unwrap(), E18);
        assert_eq!(to_units(E18, 18).unwrap(), E18);
        assert_eq!(to_units(10u128.pow(30), 30).unwrap(), E18);
        assert!(to_units(u128::MAX, 6).is_err());
    }

    #[test]
    fn test_from_units_truncates() {
        assert_eq!(from_units(E18, 6).unwrap(), 1_000_000);
        assert_eq!(from_units(1_999_999_999_999, 6).unwrap(), 1);
        assert_eq!(from_units(E18, 30).unwrap(), 10u128.pow(30));
    }

    #[test]
    fn test_apply_price() {
        // 5004 USDC at $1
        assert_eq!(apply_price(5004_000_000, 6, E18).unwrap(), 5004 * E18);
        // 1 DAI at $0.99
        assert_eq!(apply_price(E18, 18, 99 * E18 / 100).unwrap(), 99 * E18 / 100);
        // 1 unit of an 8-decimal asset at $1.05
        assert_eq!(apply_price(100_000_000, 8, 105 * E18 / 100).unwrap(), 105 * E18 / 100);
    }

    #[test]
    fn test_value_to_amount() {
        assert_eq!(value_to_amount(E18, 6, E18).unwrap(), 1_000_000);
        assert_eq!(value_to_amount(E18, 18, 2 * E18).unwrap(), E18 / 2);
        assert!(value_to_amount(E18, 18, 0).is_err());
    }

    #[test]
    fn test_bps_of() {
        // 0.5% of 10,000
        assert_eq!(bps_of(10_000 * E18, 50).unwrap(), 50 * E18);
        assert_eq!(bps_of(123, 0).unwrap(), 0);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(199_800_000_000_000_000_000, 18), "199.8");
        assert_eq!(format_units(5_004_000_000, 6), "5004");
        assert_eq!(format_units(1, 6), "0.000001");
    }
}
