//! Rebasing the receipt token to the vault's backing value.
//!
//! `ComputeTotalValue → ComputeDrift → (Skip | ApplyRebase)`. Opted-out
//! balances are never touched: the whole gain (or loss) lands on opted-in
//! holders through the credits-per-token rate.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::Vault;
use crate::core::RebaseState;
use crate::error::{Error, Result};
use crate::events::VaultEvent;
use crate::utils::constants::{MIN_REBASE_CHANGE, SCALE};
use crate::utils::math::{bps_of, mul_div};

/// Signed difference between backing value and supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupplyChange {
    /// Backing exceeds supply
    Gain(u128),
    /// Supply exceeds backing
    Loss(u128),
}

impl SupplyChange {
    fn between(total_value: u128, supply: u128) -> Self {
        if total_value >= supply {
            SupplyChange::Gain(total_value - supply)
        } else {
            SupplyChange::Loss(supply - total_value)
        }
    }

    /// Absolute size of the change
    pub fn magnitude(&self) -> u128 {
        match self {
            SupplyChange::Gain(v) | SupplyChange::Loss(v) => *v,
        }
    }
}

/// Details of an applied rebase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebaseReport {
    /// Rate before the rebase
    pub previous_credits_per_token: u128,
    /// Rate after the rebase
    pub credits_per_token: u128,
    /// Supply before the rebase
    pub previous_supply: u128,
    /// Backing value the supply was moved to
    pub total_value: u128,
    /// Yield or loss distributed
    pub change: SupplyChange,
    /// Receipt tokens minted to the trustee
    pub trustee_fee: u128,
}

/// What a rebase call did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RebaseOutcome {
    /// Rebasing is paused
    Paused,
    /// Nothing has been minted yet
    NoSupply,
    /// Change too small to act on
    BelowThreshold(SupplyChange),
    /// No opted-in supply to re-rate
    NoRebasingSupply,
    /// Supply moved to the backing value
    Rebased(RebaseReport),
}

impl Vault {
    /// Bring the receipt supply in line with total backing value
    pub fn rebase(&mut self) -> Result<RebaseOutcome> {
        self.transact("rebase", |vault, _| vault.rebase_inner())
    }

    pub(crate) fn rebase_inner(&mut self) -> Result<RebaseOutcome> {
        if self.ledger.state.rebase_paused {
            debug!("rebase paused");
            return Ok(RebaseOutcome::Paused);
        }

        let supply = self.ledger.token.total_supply();
        if supply == 0 {
            return Ok(RebaseOutcome::NoSupply);
        }

        let total_value = self.total_value()?;
        let change = SupplyChange::between(total_value, supply);

        let max = self.ledger.state.max_supply_diff;
        if max > 0 {
            let diff = mul_div(change.magnitude(), SCALE, supply)?;
            if diff > max {
                return Err(Error::MaxSupplyDiffExceeded { diff, max });
            }
        }

        if change.magnitude() < MIN_REBASE_CHANGE {
            debug!(?change, "change below rebase threshold");
            return Ok(RebaseOutcome::BelowThreshold(change));
        }

        if !self.ledger.token.can_rebase_to(total_value) {
            warn!(total_value, supply, "no rebasing supply to re-rate");
            return Ok(RebaseOutcome::NoRebasingSupply);
        }

        let previous_credits_per_token = self.ledger.token.rebasing_credits_per_token();
        let trustee_fee = match change {
            SupplyChange::Gain(gain) => self.mint_trustee_fee(gain)?,
            SupplyChange::Loss(_) => 0,
        };

        let credits_per_token = self
            .ledger
            .token
            .change_supply(total_value)?
            .ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "no rebasing supply left at total value {} after trustee fee",
                    total_value
                ))
            })?;

        self.emit(VaultEvent::Rebased {
            previous_credits_per_token,
            credits_per_token,
            total_value,
        });
        info!(
            total_value,
            previous_supply = supply,
            ?change,
            trustee_fee,
            credits_per_token,
            "rebased"
        );

        Ok(RebaseOutcome::Rebased(RebaseReport {
            previous_credits_per_token,
            credits_per_token,
            previous_supply: supply,
            total_value,
            change,
            trustee_fee,
        }))
    }

    /// Mint the trustee's share of `gain` as non-rebasing supply
    fn mint_trustee_fee(&mut self, gain: u128) -> Result<u128> {
        let state = &self.ledger.state;
        let trustee = match state.trustee_address {
            Some(trustee) if state.trustee_fee_bps > 0 => trustee,
            _ => return Ok(0),
        };

        let fee = bps_of(gain, state.trustee_fee_bps)?;
        if fee == 0 {
            return Ok(0);
        }

        if self.ledger.token.rebase_state(&trustee) == RebaseState::Rebasing {
            self.ledger.token.rebase_opt_out(trustee)?;
            self.emit(VaultEvent::RebaseOptOut { account: trustee });
        }
        self.ledger.token.mint(trustee, fee)?;
        self.emit(VaultEvent::TrusteeFeeMinted {
            trustee,
            amount: fee,
        });
        Ok(fee)
    }
}
