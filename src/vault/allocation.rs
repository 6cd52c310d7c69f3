//! Allocation of vault-held capital into strategies.
//!
//! The vault keeps `vault_buffer` of its total value on hand and pushes the
//! rest of every routed asset (one with a default strategy) into that
//! strategy. Vault-held assets without a route count towards the buffer
//! first; routed assets then keep the same share of their vault balance, so
//! the remaining buffer is spread in proportion to what the vault holds.

use serde::Serialize;
use tracing::{debug, info};

use super::journal::MoveJournal;
use super::Vault;
use crate::error::{Error, Result};
use crate::events::VaultEvent;
use crate::strategy::StrategyRef;
use crate::utils::address::Address;
use crate::utils::math::{apply_price, mul_div_up, safe_add};

/// A single vault → strategy transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationMove {
    /// Receiving strategy
    pub strategy: Address,
    /// Asset moved
    pub asset: Address,
    /// Amount, native units
    pub amount: u128,
}

/// What an allocation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllocationOutcome {
    /// Transfers performed, in registry order
    pub moves: Vec<AllocationMove>,
}

impl AllocationOutcome {
    /// Check if nothing moved
    pub fn is_noop(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Vault {
    /// Push vault-held funds above the buffer into default strategies
    pub fn allocate(&mut self) -> Result<AllocationOutcome> {
        if self.ledger.state.capital_paused {
            return Err(Error::CapitalPaused);
        }
        self.transact("allocate", |vault, journal| vault.allocate_inner(journal))
    }

    /// Governance: move funds between two approved strategies
    pub fn reallocate(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        assets: &[Address],
        amounts: &[u128],
    ) -> Result<()> {
        self.ensure_governor(caller)?;
        self.transact("reallocate", |vault, journal| {
            let source = vault
                .ledger
                .strategies
                .get(from)
                .cloned()
                .ok_or(Error::InvalidFromStrategy(*from))?;
            let target = vault
                .ledger
                .strategies
                .get(to)
                .cloned()
                .ok_or(Error::InvalidToStrategy(*to))?;

            if assets.len() != amounts.len() {
                return Err(Error::InvalidParameter {
                    name: "amounts".into(),
                    reason: format!(
                        "{} assets but {} amounts",
                        assets.len(),
                        amounts.len()
                    ),
                });
            }
            if let Some(asset) = assets.iter().find(|a| !target.supports_asset(a)) {
                return Err(Error::AssetUnsupported(*asset));
            }

            for (asset, &amount) in assets.iter().zip(amounts) {
                if amount == 0 {
                    continue;
                }
                vault.withdraw_from_strategy(journal, &source, asset, amount)?;
                vault.deposit_to_strategy(journal, &target, asset, amount)?;
                vault.emit(VaultEvent::Reallocated {
                    from: *from,
                    to: *to,
                    asset: *asset,
                    amount,
                });
            }

            info!(
                from = %from.short(),
                to = %to.short(),
                assets = assets.len(),
                "reallocated"
            );
            Ok(())
        })
    }

    pub(crate) fn allocate_inner(&mut self, journal: &mut MoveJournal) -> Result<AllocationOutcome> {
        let total_value = self.total_value()?;
        let buffer_target = self.ledger.state.buffer_fraction().apply(total_value)?;

        // Vault-held funds of assets without a route already count towards
        // the buffer; routed assets share whatever is left of it
        let mut routed: Vec<(StrategyRef, Address, u128)> = Vec::new();
        let mut routed_value = 0u128;
        let mut unrouted_value = 0u128;
        for asset in self.ledger.assets.list_supported() {
            let held = self.vault_balance(&asset.address);
            let value = self.value_of(asset, held)?;
            match asset
                .default_strategy
                .as_ref()
                .and_then(|id| self.ledger.strategies.get(id))
            {
                Some(strategy) => {
                    routed_value = safe_add(routed_value, value)?;
                    if held > 0 {
                        routed.push((strategy.clone(), asset.address, held));
                    }
                }
                None => unrouted_value = safe_add(unrouted_value, value)?,
            }
        }
        if routed_value == 0 {
            return Ok(AllocationOutcome::default());
        }

        let routed_buffer = buffer_target.saturating_sub(unrouted_value);
        let dust = self.allocation_dust()?;
        if routed_value <= safe_add(routed_buffer, dust)? {
            debug!(routed_value, routed_buffer, dust, "nothing to allocate");
            return Ok(AllocationOutcome::default());
        }

        let mut plan: Vec<(StrategyRef, Address, u128)> = Vec::new();
        for (strategy, asset, held) in routed {
            // routed_buffer < routed_value here, so kept <= held
            let kept = mul_div_up(held, routed_buffer, routed_value)?;
            let amount = held.saturating_sub(kept);
            if amount > 0 {
                plan.push((strategy, asset, amount));
            }
        }

        let mut outcome = AllocationOutcome::default();
        for (strategy, asset, amount) in plan {
            self.deposit_to_strategy(journal, &strategy, &asset, amount)?;
            self.emit(VaultEvent::Allocated {
                strategy: strategy.id(),
                asset,
                amount,
            });
            debug!(strategy = %strategy.id().short(), asset = %asset.short(), amount, "allocated");
            outcome.moves.push(AllocationMove {
                strategy: strategy.id(),
                asset,
                amount,
            });
        }

        info!(
            total_value,
            buffer_target,
            routed_value,
            moves = outcome.moves.len(),
            "allocation complete"
        );
        Ok(outcome)
    }

    /// Allocate after a mint if the buffer is zero or the excess over the
    /// buffer target has grown past the auto-allocate threshold
    pub(crate) fn auto_allocate(
        &mut self,
        journal: &mut MoveJournal,
    ) -> Result<Option<AllocationOutcome>> {
        let state = &self.ledger.state;
        let trigger = if state.vault_buffer == 0 {
            true
        } else {
            let threshold = state.auto_allocate_threshold;
            let buffer_target = state.buffer_fraction().apply(self.total_value()?)?;
            self.vault_value()?.saturating_sub(buffer_target) > threshold
        };

        if !trigger {
            return Ok(None);
        }
        self.allocate_inner(journal).map(Some)
    }

    /// Rounding slack below which vault value is considered at the buffer:
    /// one native unit of every asset plus two value units per asset
    fn allocation_dust(&self) -> Result<u128> {
        let mut dust = 0u128;
        for asset in self.ledger.assets.list_supported() {
            let price = self.price_usd_redeem(&asset.address)?;
            let unit = apply_price(1, asset.decimals, price)?;
            dust = safe_add(dust, safe_add(unit, 2)?)?;
        }
        Ok(dust)
    }
}
