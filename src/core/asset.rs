//! Supported deposit assets.
//!
//! The registry keeps assets in insertion order. That order is
//! load-bearing: allocation and redemption baskets iterate it, so a
//! re-supported asset keeps its original slot.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::strategy::StrategyRef;
use crate::utils::address::Address;
use crate::utils::validation::validate_decimals;

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET
// ═══════════════════════════════════════════════════════════════════════════════

/// A deposit asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset identifier
    pub address: Address,
    /// Display symbol
    pub symbol: String,
    /// Native decimals
    pub decimals: u8,
    /// Whether the vault currently accepts the asset
    pub is_supported: bool,
    /// Strategy that receives allocations of this asset
    pub default_strategy: Option<Address>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// All assets the vault has ever supported
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
}

impl AssetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Support an asset (or re-support a removed one)
    pub fn support_asset(&mut self, address: Address, symbol: &str, decimals: u8) -> Result<()> {
        validate_decimals(decimals)?;

        match self.assets.iter_mut().find(|a| a.address == address) {
            Some(asset) if asset.is_supported => Err(Error::AlreadySupported(address)),
            Some(asset) => {
                asset.symbol = symbol.to_string();
                asset.decimals = decimals;
                asset.is_supported = true;
                asset.default_strategy = None;
                Ok(())
            }
            None => {
                self.assets.push(Asset {
                    address,
                    symbol: symbol.to_string(),
                    decimals,
                    is_supported: true,
                    default_strategy: None,
                });
                Ok(())
            }
        }
    }

    /// Stop supporting an asset. The record stays in place.
    pub fn remove_asset(&mut self, address: &Address) -> Result<()> {
        let asset = self.supported_mut(address)?;
        asset.is_supported = false;
        asset.default_strategy = None;
        Ok(())
    }

    /// Route allocations of `asset` to `strategy`, or stop routing with `None`
    pub fn set_default_strategy(
        &mut self,
        address: &Address,
        strategy: Option<&StrategyRef>,
    ) -> Result<()> {
        let asset = self.supported_mut(address)?;
        match strategy {
            Some(strategy) => {
                if !strategy.supports_asset(address) {
                    return Err(Error::StrategyDoesNotSupportAsset {
                        strategy: strategy.id(),
                        asset: *address,
                    });
                }
                asset.default_strategy = Some(strategy.id());
            }
            None => asset.default_strategy = None,
        }
        Ok(())
    }

    /// Get any registered asset, supported or not
    pub fn get(&self, address: &Address) -> Option<&Asset> {
        self.assets.iter().find(|a| a.address == *address)
    }

    /// Get a supported asset
    pub fn supported(&self, address: &Address) -> Result<&Asset> {
        self.assets
            .iter()
            .find(|a| a.is_supported && a.address == *address)
            .ok_or(Error::UnsupportedAsset(*address))
    }

    /// Check if an asset is supported
    pub fn is_supported(&self, address: &Address) -> bool {
        self.supported(address).is_ok()
    }

    /// Supported assets in insertion order
    pub fn list_supported(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(|a| a.is_supported)
    }

    /// Supported assets routed to `strategy`
    pub fn defaults_to<'a>(&'a self, strategy: &'a Address) -> impl Iterator<Item = &'a Asset> {
        self.list_supported()
            .filter(move |a| a.default_strategy.as_ref() == Some(strategy))
    }

    /// Number of supported assets
    pub fn count(&self) -> usize {
        self.list_supported().count()
    }

    fn supported_mut(&mut self, address: &Address) -> Result<&mut Asset> {
        self.assets
            .iter_mut()
            .find(|a| a.is_supported && a.address == *address)
            .ok_or(Error::UnknownAsset(*address))
    }
}
