//! Approved strategy registry.

use tracing::debug;

use super::StrategyRef;
use crate::error::{Error, Result};
use crate::utils::address::Address;

#[derive(Debug, Clone)]
struct StrategyEntry {
    strategy: StrategyRef,
    is_supported: bool,
}

/// Strategies the vault may allocate into, in approval order.
///
/// Removed strategies keep their slot so that approving the same
/// identifier again re-uses it.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    entries: Vec<StrategyEntry>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Approve a strategy
    pub fn approve(&mut self, strategy: StrategyRef) -> Result<()> {
        let id = strategy.id();
        match self.entries.iter_mut().find(|e| e.strategy.id() == id) {
            Some(entry) if entry.is_supported => Err(Error::AlreadyApproved(id)),
            Some(entry) => {
                debug!(strategy = %id.short(), "re-approving strategy");
                entry.strategy = strategy;
                entry.is_supported = true;
                Ok(())
            }
            None => {
                self.entries.push(StrategyEntry {
                    strategy,
                    is_supported: true,
                });
                Ok(())
            }
        }
    }

    /// Fail with `BalanceNotZero` while the strategy holds any balance
    pub fn ensure_empty(&self, id: &Address) -> Result<()> {
        let strategy = self.get(id).ok_or(Error::StrategyNotApproved(*id))?;
        for asset in strategy.supported_assets() {
            let balance = strategy.check_balance(&asset)?;
            if balance > 0 {
                return Err(Error::BalanceNotZero {
                    strategy: *id,
                    asset,
                    balance,
                });
            }
        }
        Ok(())
    }

    /// Remove an approved strategy. Callers check [`Self::ensure_empty`] first.
    pub fn remove(&mut self, id: &Address) -> Result<StrategyRef> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.is_supported && e.strategy.id() == *id)
            .ok_or(Error::StrategyNotApproved(*id))?;
        entry.is_supported = false;
        Ok(entry.strategy.clone())
    }

    /// Get an approved strategy
    pub fn get(&self, id: &Address) -> Option<&StrategyRef> {
        self.entries
            .iter()
            .find(|e| e.is_supported && e.strategy.id() == *id)
            .map(|e| &e.strategy)
    }

    /// Check if a strategy is approved
    pub fn is_approved(&self, id: &Address) -> bool {
        self.get(id).is_some()
    }

    /// Approved strategies in approval order
    pub fn approved(&self) -> impl Iterator<Item = &StrategyRef> {
        self.entries
            .iter()
            .filter(|e| e.is_supported)
            .map(|e| &e.strategy)
    }

    /// Approved strategies that accept `asset`
    pub fn supporting<'a>(&'a self, asset: &'a Address) -> impl Iterator<Item = &'a StrategyRef> {
        self.approved().filter(move |s| s.supports_asset(asset))
    }

    /// Number of approved strategies
    pub fn count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_supported).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{InMemoryStrategy, Strategy};
    use std::sync::Arc;

    fn dai() -> Address {
        Address::from_label("DAI")
    }

    fn strategy(name: &str) -> Arc<InMemoryStrategy> {
        Arc::new(InMemoryStrategy::new(
            Address::from_label(name),
            Address::from_label("vault"),
            vec![dai()],
        ))
    }

    #[test]
    fn test_approve_and_count() {
        let mut registry = StrategyRegistry::new();
        let a = strategy("A");
        registry.approve(a.clone()).unwrap();
        assert_eq!(registry.count(), 1);
        assert!(registry.is_approved(&a.id()));
        assert_eq!(registry.approve(a.clone()), Err(Error::AlreadyApproved(a.id())));
    }

    #[test]
    fn test_remove_requires_empty() {
        let mut registry = StrategyRegistry::new();
        let a = strategy("A");
        registry.approve(a.clone()).unwrap();
        a.deposit(&dai(), 5).unwrap();

        assert!(matches!(
            registry.ensure_empty(&a.id()),
            Err(Error::BalanceNotZero { balance: 5, .. })
        ));

        a.withdraw(&Address::from_label("vault"), &dai(), 5).unwrap();
        registry.ensure_empty(&a.id()).unwrap();
        registry.remove(&a.id()).unwrap();
        assert_eq!(registry.count(), 0);
        assert!(!registry.is_approved(&a.id()));
    }

    #[test]
    fn test_reapprove_reuses_slot() {
        let mut registry = StrategyRegistry::new();
        let a = strategy("A");
        let b = strategy("B");
        registry.approve(a.clone()).unwrap();
        registry.approve(b.clone()).unwrap();
        registry.remove(&a.id()).unwrap();
        registry.approve(a.clone()).unwrap();

        let order: Vec<Address> = registry.approved().map(|s| s.id()).collect();
        assert_eq!(order, vec![a.id(), b.id()]);
    }

    #[test]
    fn test_remove_unknown() {
        let mut registry = StrategyRegistry::new();
        let id = Address::from_label("missing");
        assert!(matches!(
            registry.remove(&id),
            Err(Error::StrategyNotApproved(_))
        ));
        assert!(matches!(
            registry.ensure_empty(&id),
            Err(Error::StrategyNotApproved(_))
        ));
    }
}
