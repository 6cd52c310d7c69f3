//! Shared, re-entrancy guarded access to a vault.
//!
//! Strategies and oracles are external code. If one of them calls back into
//! the vault while an operation is in flight on the same thread, the call
//! fails with `Reentrancy` instead of deadlocking or observing half-applied
//! state. Other threads simply wait their turn.

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use tracing::warn;

use super::{AllocationOutcome, RebaseOutcome, RedeemOutcome, Vault, VaultStatus};
use crate::error::{Error, Result};
use crate::utils::address::Address;

/// Cloneable handle to a vault behind a lock
#[derive(Debug, Clone)]
pub struct VaultHandle {
    inner: Arc<Mutex<Vault>>,
    holder: Arc<Mutex<Option<ThreadId>>>,
}

/// Marks the current thread as inside the vault until dropped
struct Entered<'a> {
    holder: &'a Mutex<Option<ThreadId>>,
}

impl<'a> Entered<'a> {
    fn new(holder: &'a Mutex<Option<ThreadId>>, thread: ThreadId) -> Result<Self> {
        *holder.lock().map_err(|_| Error::Lock)? = Some(thread);
        Ok(Self { holder })
    }
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        if let Ok(mut holder) = self.holder.lock() {
            *holder = None;
        }
    }
}

impl VaultHandle {
    /// Wrap a vault
    pub fn new(vault: Vault) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vault)),
            holder: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `f` with exclusive access to the vault
    pub fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vault) -> Result<T>,
    {
        let current = thread::current().id();
        if *self.holder.lock().map_err(|_| Error::Lock)? == Some(current) {
            warn!("re-entrant vault call rejected");
            return Err(Error::Reentrancy);
        }

        let mut vault = self.inner.lock().map_err(|_| Error::Lock)?;
        let _entered = Entered::new(&self.holder, current)?;
        f(&mut vault)
    }

    /// See [`Vault::mint`]
    pub fn mint(
        &self,
        caller: &Address,
        asset: &Address,
        amount: u128,
        min_received: u128,
    ) -> Result<u128> {
        self.with(|vault| vault.mint(caller, asset, amount, min_received))
    }

    /// See [`Vault::redeem`]
    pub fn redeem(&self, caller: &Address, amount: u128, min_received: u128) -> Result<RedeemOutcome> {
        self.with(|vault| vault.redeem(caller, amount, min_received))
    }

    /// See [`Vault::redeem_all`]
    pub fn redeem_all(&self, caller: &Address, min_received: u128) -> Result<RedeemOutcome> {
        self.with(|vault| vault.redeem_all(caller, min_received))
    }

    /// See [`Vault::allocate`]
    pub fn allocate(&self) -> Result<AllocationOutcome> {
        self.with(|vault| vault.allocate())
    }

    /// See [`Vault::rebase`]
    pub fn rebase(&self) -> Result<RebaseOutcome> {
        self.with(|vault| vault.rebase())
    }

    /// See [`Vault::total_value`]
    pub fn total_value(&self) -> Result<u128> {
        self.with(|vault| vault.total_value())
    }

    /// See [`Vault::balance_of`]
    pub fn balance_of(&self, account: &Address) -> Result<u128> {
        self.with(|vault| Ok(vault.balance_of(account)))
    }

    /// See [`Vault::status`]
    pub fn status(&self) -> Result<VaultStatus> {
        self.with(|vault| vault.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FixedPriceOracle;
    use crate::strategy::{InMemoryStrategy, Strategy, StrategyRef};
    use crate::utils::constants::SCALE;

    /// Calls back into the vault from inside `deposit`
    #[derive(Debug)]
    struct CallbackStrategy {
        inner: InMemoryStrategy,
        handle: Mutex<Option<VaultHandle>>,
        attacker: Address,
    }

    impl Strategy for CallbackStrategy {
        fn id(&self) -> Address {
            self.inner.id()
        }

        fn deposit(&self, asset: &Address, amount: u128) -> Result<()> {
            let handle = self.handle.lock().map_err(|_| Error::Lock)?.clone();
            if let Some(handle) = handle {
                handle.mint(&self.attacker, asset, SCALE, 0)?;
            }
            self.inner.deposit(asset, amount)
        }

        fn withdraw(&self, recipient: &Address, asset: &Address, amount: u128) -> Result<()> {
            self.inner.withdraw(recipient, asset, amount)
        }

        fn withdraw_all(&self, recipient: &Address) -> Result<Vec<(Address, u128)>> {
            self.inner.withdraw_all(recipient)
        }

        fn check_balance(&self, asset: &Address) -> Result<u128> {
            self.inner.check_balance(asset)
        }

        fn supports_asset(&self, asset: &Address) -> bool {
            self.inner.supports_asset(asset)
        }

        fn supported_assets(&self) -> Vec<Address> {
            self.inner.supported_assets()
        }
    }

    fn pegged_vault(dai: Address) -> (Vault, Address) {
        let governor = Address::from_label("governor");
        let oracle = Arc::new(FixedPriceOracle::pegged(&[dai]));
        let mut vault = Vault::new(Address::from_label("vault"), governor, oracle);
        vault.support_asset(&governor, dai, "DAI", 18).unwrap();
        (vault, governor)
    }

    #[test]
    fn test_reentrant_mint_rejected_and_rolled_back() {
        let dai = Address::from_label("DAI");
        let (mut vault, governor) = pegged_vault(dai);
        let id = Address::from_label("callback");
        let strategy = Arc::new(CallbackStrategy {
            inner: InMemoryStrategy::new(id, vault.address(), vec![dai]),
            handle: Mutex::new(None),
            attacker: Address::from_label("attacker"),
        });
        let strategy_ref: StrategyRef = strategy.clone();
        vault.approve_strategy(&governor, strategy_ref).unwrap();
        vault
            .set_asset_default_strategy(&governor, &dai, Some(&id))
            .unwrap();

        let handle = VaultHandle::new(vault);
        *strategy.handle.lock().unwrap() = Some(handle.clone());

        let alice = Address::from_label("alice");
        // zero buffer: the mint auto-allocates into the callback strategy
        let result = handle.mint(&alice, &dai, 10 * SCALE, 0);
        assert_eq!(result, Err(Error::Reentrancy));

        assert_eq!(handle.balance_of(&alice).unwrap(), 0);
        assert_eq!(handle.balance_of(&strategy.attacker).unwrap(), 0);
        assert_eq!(handle.total_value().unwrap(), 0);
        assert_eq!(strategy.check_balance(&dai).unwrap(), 0);
    }

    #[test]
    fn test_guard_released_after_error() {
        let dai = Address::from_label("DAI");
        let (vault, _) = pegged_vault(dai);
        let handle = VaultHandle::new(vault);
        let alice = Address::from_label("alice");

        assert!(handle.redeem(&alice, SCALE, 0).is_err());
        assert_eq!(handle.mint(&alice, &dai, SCALE, 0).unwrap(), SCALE);
    }

    #[test]
    fn test_concurrent_mints_serialize() {
        let dai = Address::from_label("DAI");
        let (vault, _) = pegged_vault(dai);
        let handle = VaultHandle::new(vault);

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let handle = handle.clone();
                thread::spawn(move || {
                    let account = Address::from_label(&format!("user-{}", i));
                    for _ in 0..10 {
                        handle.mint(&account, &dai, SCALE, 0).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(handle.with(|v| Ok(v.total_supply())).unwrap(), 40 * SCALE);
    }
}
