//! Input validation utilities for the XUSD vault.
//!
//! This module provides validation functions to ensure inputs meet
//! vault requirements before processing.

use crate::error::{Error, Result};
use crate::utils::address::Address;
use crate::utils::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// AMOUNT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate that an amount is non-zero
pub fn validate_non_zero(amount: u128) -> Result<()> {
    if amount == 0 {
        return Err(Error::ZeroAmount);
    }
    Ok(())
}

/// Validate that the received amount meets the caller's minimum
pub fn validate_min_received(actual: u128, minimum: u128) -> Result<()> {
    if actual < minimum {
        return Err(Error::Slippage { minimum, actual });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// RATIO VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate a basis point value (0..=10000)
pub fn validate_bps(bps: u128, name: &str) -> Result<()> {
    if bps > BPS_DIVISOR {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: format!("{} bps exceeds {}", bps, BPS_DIVISOR),
        });
    }
    Ok(())
}

/// Validate an 18-decimal fraction (0..=1e18)
pub fn validate_fraction(value: u128, name: &str) -> Result<()> {
    if value > SCALE {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: format!("{} exceeds 100% ({})", value, SCALE),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET & ORACLE VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate asset decimals are within the supported range
pub fn validate_decimals(decimals: u8) -> Result<()> {
    if !(MIN_ASSET_DECIMALS..=MAX_ASSET_DECIMALS).contains(&decimals) {
        return Err(Error::InvalidParameter {
            name: "decimals".into(),
            reason: format!(
                "{} outside supported range {}..={}",
                decimals, MIN_ASSET_DECIMALS, MAX_ASSET_DECIMALS
            ),
        });
    }
    Ok(())
}

/// Validate a price returned by an oracle
pub fn validate_price(asset: Address, price: u128) -> Result<u128> {
    if price == 0 || price > MAX_PRICE {
        return Err(Error::InvalidPrice { asset, price });
    }
    Ok(price)
}

/// Validate that an address is not the zero address
pub fn validate_address(address: &Address, name: &str) -> Result<()> {
    if address.is_zero() {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: "zero address".into(),
        });
    }
    Ok(())
}
