//! Static price feed.
//!
//! This module provides the reference oracle:
//! - Price storage and retrieval per asset
//! - Price validation on update
//! - Mint/redeem spread around the $1 peg

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::info;

use super::PriceOracle;
use crate::error::{Error, Result};
use crate::utils::address::Address;
use crate::utils::constants::PEG_PRICE;
use crate::utils::validation::validate_price;

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE DATA
// ═══════════════════════════════════════════════════════════════════════════════

/// A single price data point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceData {
    /// USD price, 18 decimals
    pub price: u128,
    /// When the price was set
    pub updated_at: DateTime<Utc>,
}

impl PriceData {
    /// Create a new price data point stamped now
    pub fn new(price: u128) -> Self {
        Self {
            price,
            updated_at: Utc::now(),
        }
    }

    /// Mint side: never above the peg
    pub fn mint_price(&self) -> u128 {
        self.price.min(PEG_PRICE)
    }

    /// Redeem side: never below the peg
    pub fn redeem_price(&self) -> u128 {
        self.price.max(PEG_PRICE)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIXED PRICE ORACLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Oracle returning governable static prices.
///
/// Depositors never get more than $1 per unit and redeemers never get an
/// asset for less than $1, so a depegged asset cannot be used to drain the
/// vault.
#[derive(Debug, Default)]
pub struct FixedPriceOracle {
    prices: RwLock<BTreeMap<Address, PriceData>>,
}

impl FixedPriceOracle {
    /// Create an empty oracle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an oracle with every listed asset at the peg
    pub fn pegged(assets: &[Address]) -> Self {
        let prices = assets
            .iter()
            .map(|a| (*a, PriceData::new(PEG_PRICE)))
            .collect();
        Self {
            prices: RwLock::new(prices),
        }
    }

    /// Set the price of an asset
    pub fn set_price(&self, asset: Address, price: u128) -> Result<()> {
        validate_price(asset, price)?;
        let mut prices = self.prices.write().map_err(|_| Error::Lock)?;
        prices.insert(asset, PriceData::new(price));
        info!(asset = %asset.short(), price, "price updated");
        Ok(())
    }

    /// Latest price data for an asset
    pub fn price_data(&self, asset: &Address) -> Result<PriceData> {
        let prices = self.prices.read().map_err(|_| Error::Lock)?;
        prices
            .get(asset)
            .copied()
            .ok_or(Error::PriceUnavailable(*asset))
    }
}

impl PriceOracle for FixedPriceOracle {
    fn price_usd_mint(&self, asset: &Address) -> Result<u128> {
        Ok(self.price_data(asset)?.mint_price())
    }

    fn price_usd_redeem(&self, asset: &Address) -> Result<u128> {
        Ok(self.price_data(asset)?.redeem_price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::SCALE;

    fn dai() -> Address {
        Address::from_label("DAI")
    }

    #[test]
    fn test_missing_price() {
        let oracle = FixedPriceOracle::new();
        assert_eq!(
            oracle.price_usd_mint(&dai()),
            Err(Error::PriceUnavailable(dai()))
        );
    }

    #[test]
    fn test_spread_around_peg() {
        let oracle = FixedPriceOracle::new();

        oracle.set_price(dai(), SCALE * 105 / 100).unwrap();
        assert_eq!(oracle.price_usd_mint(&dai()).unwrap(), SCALE);
        assert_eq!(oracle.price_usd_redeem(&dai()).unwrap(), SCALE * 105 / 100);

        oracle.set_price(dai(), SCALE * 95 / 100).unwrap();
        assert_eq!(oracle.price_usd_mint(&dai()).unwrap(), SCALE * 95 / 100);
        assert_eq!(oracle.price_usd_redeem(&dai()).unwrap(), SCALE);
    }

    #[test]
    fn test_rejects_invalid_price() {
        let oracle = FixedPriceOracle::pegged(&[dai()]);
        assert!(oracle.set_price(dai(), 0).is_err());
        assert_eq!(oracle.price_usd_redeem(&dai()).unwrap(), SCALE);
    }
}
