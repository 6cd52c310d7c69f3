//! Oracle module for asset prices.
//!
//! The vault consumes two USD prices per asset, both 18 decimals:
//! - the **mint** price values deposits (treated as already capped at $1)
//! - the **redeem** price values everything else: total value, buffer
//!   targets, rebases and redemption baskets
//!
//! Concrete feeds live outside this crate; `FixedPriceOracle` is a
//! governable static oracle for tests, simulations and pegged deployments.

pub mod price_feed;

pub use price_feed::*;

use std::fmt;

use crate::error::Result;
use crate::utils::address::Address;

/// Source of per-asset USD prices
pub trait PriceOracle: Send + Sync + fmt::Debug {
    /// Price used to value deposits, 18 decimals
    fn price_usd_mint(&self, asset: &Address) -> Result<u128>;

    /// Price used to value holdings and redemptions, 18 decimals
    fn price_usd_redeem(&self, asset: &Address) -> Result<u128>;
}
