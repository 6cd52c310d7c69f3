//! In-memory reference strategy.
//!
//! Holds balances in a map behind a lock and lets tests and the simulator
//! script yield, losses, illiquidity and outright failures.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use tracing::{debug, warn};

use super::Strategy;
use crate::error::{Error, Result};
use crate::utils::address::Address;

#[derive(Debug, Default)]
struct Book {
    balances: BTreeMap<Address, u128>,
    illiquid: BTreeSet<Address>,
    fail_deposits: bool,
}

/// A strategy whose position is a plain balance map
#[derive(Debug)]
pub struct InMemoryStrategy {
    id: Address,
    vault: Address,
    assets: Vec<Address>,
    book: RwLock<Book>,
}

impl InMemoryStrategy {
    /// Create a strategy bound to `vault` that accepts `assets`
    pub fn new(id: Address, vault: Address, assets: Vec<Address>) -> Self {
        Self {
            id,
            vault,
            assets,
            book: RwLock::new(Book::default()),
        }
    }

    /// Credit yield to the position
    pub fn accrue(&self, asset: &Address, amount: u128) -> Result<()> {
        self.ensure_supported(asset)?;
        let mut book = self.book.write().map_err(|_| Error::Lock)?;
        let balance = book.balances.entry(*asset).or_insert(0);
        *balance = balance.checked_add(amount).ok_or_else(|| Error::Overflow {
            operation: "strategy accrue".into(),
        })?;
        Ok(())
    }

    /// Write the position down (a venue loss)
    pub fn slash(&self, asset: &Address, amount: u128) -> Result<()> {
        let mut book = self.book.write().map_err(|_| Error::Lock)?;
        let balance = book.balances.entry(*asset).or_insert(0);
        *balance = balance.saturating_sub(amount);
        Ok(())
    }

    /// Make an asset's position unwithdrawable (or liquid again)
    pub fn set_illiquid(&self, asset: &Address, illiquid: bool) -> Result<()> {
        let mut book = self.book.write().map_err(|_| Error::Lock)?;
        if illiquid {
            book.illiquid.insert(*asset);
        } else {
            book.illiquid.remove(asset);
        }
        Ok(())
    }

    /// Make every subsequent deposit fail
    pub fn set_fail_deposits(&self, fail: bool) -> Result<()> {
        self.book.write().map_err(|_| Error::Lock)?.fail_deposits = fail;
        Ok(())
    }

    fn ensure_supported(&self, asset: &Address) -> Result<()> {
        if !self.supports_asset(asset) {
            return Err(Error::StrategyDoesNotSupportAsset {
                strategy: self.id,
                asset: *asset,
            });
        }
        Ok(())
    }

    fn ensure_vault(&self, recipient: &Address) -> Result<()> {
        if *recipient != self.vault {
            return Err(Error::NotVault(*recipient));
        }
        Ok(())
    }

    fn failure(&self, reason: impl Into<String>) -> Error {
        Error::Strategy {
            strategy: self.id,
            reason: reason.into(),
        }
    }
}

impl Strategy for InMemoryStrategy {
    fn id(&self) -> Address {
        self.id
    }

    fn deposit(&self, asset: &Address, amount: u128) -> Result<()> {
        self.ensure_supported(asset)?;
        let mut book = self.book.write().map_err(|_| Error::Lock)?;
        if book.fail_deposits {
            return Err(self.failure("deposits disabled"));
        }
        let balance = book.balances.entry(*asset).or_insert(0);
        *balance = balance.checked_add(amount).ok_or_else(|| Error::Overflow {
            operation: "strategy deposit".into(),
        })?;
        debug!(strategy = %self.id.short(), asset = %asset.short(), amount, "deposit");
        Ok(())
    }

    fn withdraw(&self, recipient: &Address, asset: &Address, amount: u128) -> Result<()> {
        self.ensure_vault(recipient)?;
        self.ensure_supported(asset)?;
        let mut book = self.book.write().map_err(|_| Error::Lock)?;
        if book.illiquid.contains(asset) {
            return Err(self.failure(format!("{} is illiquid", asset.short())));
        }
        let balance = book.balances.entry(*asset).or_insert(0);
        if *balance < amount {
            return Err(self.failure(format!(
                "withdraw {} exceeds balance {}",
                amount, *balance
            )));
        }
        *balance -= amount;
        debug!(strategy = %self.id.short(), asset = %asset.short(), amount, "withdraw");
        Ok(())
    }

    fn withdraw_all(&self, recipient: &Address) -> Result<Vec<(Address, u128)>> {
        self.ensure_vault(recipient)?;
        let mut book = self.book.write().map_err(|_| Error::Lock)?;
        let Book {
            balances, illiquid, ..
        } = &mut *book;

        let mut paid = Vec::new();
        for asset in &self.assets {
            if illiquid.contains(asset) {
                warn!(strategy = %self.id.short(), asset = %asset.short(), "skipping illiquid asset");
                continue;
            }
            if let Some(balance) = balances.get_mut(asset) {
                if *balance > 0 {
                    paid.push((*asset, *balance));
                    *balance = 0;
                }
            }
        }
        Ok(paid)
    }

    fn check_balance(&self, asset: &Address) -> Result<u128> {
        let book = self.book.read().map_err(|_| Error::Lock)?;
        Ok(book.balances.get(asset).copied().unwrap_or(0))
    }

    fn liquid_balance(&self, asset: &Address) -> Result<u128> {
        let book = self.book.read().map_err(|_| Error::Lock)?;
        if book.illiquid.contains(asset) {
            return Ok(0);
        }
        Ok(book.balances.get(asset).copied().unwrap_or(0))
    }

    fn supports_asset(&self, asset: &Address) -> bool {
        self.assets.contains(asset)
    }

    fn supported_assets(&self) -> Vec<Address> {
        self.assets.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> Address {
        Address::from_label("vault")
    }

    fn dai() -> Address {
        Address::from_label("DAI")
    }

    fn usdc() -> Address {
        Address::from_label("USDC")
    }

    fn strategy() -> InMemoryStrategy {
        InMemoryStrategy::new(Address::from_label("compound"), vault(), vec![dai(), usdc()])
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let s = strategy();
        s.deposit(&dai(), 100).unwrap();
        assert_eq!(s.check_balance(&dai()).unwrap(), 100);

        s.withdraw(&vault(), &dai(), 40).unwrap();
        assert_eq!(s.check_balance(&dai()).unwrap(), 60);
        assert!(s.withdraw(&vault(), &dai(), 61).is_err());
    }

    #[test]
    fn test_only_pays_the_vault() {
        let s = strategy();
        s.deposit(&dai(), 100).unwrap();
        let thief = Address::from_label("thief");
        assert_eq!(s.withdraw(&thief, &dai(), 1), Err(Error::NotVault(thief)));
        assert_eq!(s.withdraw_all(&thief), Err(Error::NotVault(thief)));
    }

    #[test]
    fn test_unsupported_asset() {
        let s = strategy();
        let usdt = Address::from_label("USDT");
        assert!(!s.supports_asset(&usdt));
        assert!(matches!(
            s.deposit(&usdt, 1),
            Err(Error::StrategyDoesNotSupportAsset { .. })
        ));
    }

    #[test]
    fn test_accrue_and_slash() {
        let s = strategy();
        s.deposit(&usdc(), 1_000).unwrap();
        s.accrue(&usdc(), 50).unwrap();
        assert_eq!(s.check_balance(&usdc()).unwrap(), 1_050);
        s.slash(&usdc(), 2_000).unwrap();
        assert_eq!(s.check_balance(&usdc()).unwrap(), 0);
    }

    #[test]
    fn test_withdraw_all_skips_illiquid() {
        let s = strategy();
        s.deposit(&dai(), 10).unwrap();
        s.deposit(&usdc(), 20).unwrap();
        s.set_illiquid(&usdc(), true).unwrap();

        assert_eq!(s.liquid_balance(&usdc()).unwrap(), 0);
        assert!(s.withdraw(&vault(), &usdc(), 1).is_err());

        let paid = s.withdraw_all(&vault()).unwrap();
        assert_eq!(paid, vec![(dai(), 10)]);
        assert_eq!(s.check_balance(&usdc()).unwrap(), 20);

        s.set_illiquid(&usdc(), false).unwrap();
        assert_eq!(s.withdraw_all(&vault()).unwrap(), vec![(usdc(), 20)]);
    }

    #[test]
    fn test_fail_deposits() {
        let s = strategy();
        s.set_fail_deposits(true).unwrap();
        assert!(matches!(s.deposit(&dai(), 1), Err(Error::Strategy { .. })));
        assert_eq!(s.check_balance(&dai()).unwrap(), 0);
    }
}
