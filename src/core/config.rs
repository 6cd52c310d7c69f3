//! Vault configuration.
//!
//! `VaultState` is the governable parameter set of the vault: buffer and
//! allocation policy, rebase policy, fees and pause switches. It can be
//! loaded from JSON and overlaid with `XUSD_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::address::Address;
use crate::utils::constants::*;
use crate::utils::math::FixedPoint;
use crate::utils::validation::{validate_address, validate_bps, validate_fraction};

/// Environment variable names for the overlay
pub mod env {
    /// Vault buffer, 18-decimal fraction
    pub const VAULT_BUFFER: &str = "XUSD_VAULT_BUFFER";
    /// Auto-allocate threshold, 18-decimal USD
    pub const AUTO_ALLOCATE_THRESHOLD: &str = "XUSD_AUTO_ALLOCATE_THRESHOLD";
    /// Rebase threshold, 18-decimal USD
    pub const REBASE_THRESHOLD: &str = "XUSD_REBASE_THRESHOLD";
    /// Redeem fee in basis points
    pub const REDEEM_FEE_BPS: &str = "XUSD_REDEEM_FEE_BPS";
    /// Trustee fee in basis points
    pub const TRUSTEE_FEE_BPS: &str = "XUSD_TRUSTEE_FEE_BPS";
    /// Max supply drift, 18-decimal fraction
    pub const MAX_SUPPLY_DIFF: &str = "XUSD_MAX_SUPPLY_DIFF";
}

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Governable vault parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    /// Fraction of total value kept in the vault (1e18 = 100%)
    pub vault_buffer: u128,
    /// Excess vault value (18-decimal USD) above which a mint allocates
    pub auto_allocate_threshold: u128,
    /// Mint/redeem size (18-decimal USD) above which the vault rebases
    pub rebase_threshold: u128,
    /// Redeem fee in basis points
    pub redeem_fee_bps: u128,
    /// Share of positive yield paid to the trustee, in basis points
    pub trustee_fee_bps: u128,
    /// Recipient of the trustee fee
    pub trustee_address: Option<Address>,
    /// Max relative drift between supply and backing (1e18 = 100%, 0 = off)
    pub max_supply_diff: u128,
    /// Mint and redeem are paused
    pub capital_paused: bool,
    /// Rebasing is paused
    pub rebase_paused: bool,
}

impl Default for VaultState {
    fn default() -> Self {
        Self {
            vault_buffer: DEFAULT_VAULT_BUFFER,
            auto_allocate_threshold: DEFAULT_AUTO_ALLOCATE_THRESHOLD,
            rebase_threshold: DEFAULT_REBASE_THRESHOLD,
            redeem_fee_bps: DEFAULT_REDEEM_FEE_BPS,
            trustee_fee_bps: DEFAULT_TRUSTEE_FEE_BPS,
            trustee_address: None,
            max_supply_diff: DEFAULT_MAX_SUPPLY_DIFF,
            capital_paused: false,
            rebase_paused: false,
        }
    }
}

impl VaultState {
    /// Validate all parameters
    pub fn validate(&self) -> Result<()> {
        validate_fraction(self.vault_buffer, "vault_buffer")?;
        validate_bps(self.redeem_fee_bps, "redeem_fee_bps")?;
        validate_bps(self.trustee_fee_bps, "trustee_fee_bps")?;
        validate_fraction(self.max_supply_diff, "max_supply_diff")?;
        if let Some(trustee) = &self.trustee_address {
            validate_address(trustee, "trustee_address")?;
        }
        Ok(())
    }

    /// Vault buffer as a fraction
    pub fn buffer_fraction(&self) -> FixedPoint {
        FixedPoint::from_raw(self.vault_buffer)
    }

    /// Builder: set vault buffer
    pub fn with_vault_buffer(mut self, buffer: u128) -> Self {
        self.vault_buffer = buffer;
        self
    }

    /// Builder: set auto-allocate threshold
    pub fn with_auto_allocate_threshold(mut self, threshold: u128) -> Self {
        self.auto_allocate_threshold = threshold;
        self
    }

    /// Builder: set rebase threshold
    pub fn with_rebase_threshold(mut self, threshold: u128) -> Self {
        self.rebase_threshold = threshold;
        self
    }

    /// Builder: set redeem fee
    pub fn with_redeem_fee_bps(mut self, bps: u128) -> Self {
        self.redeem_fee_bps = bps;
        self
    }

    /// Builder: set trustee and trustee fee
    pub fn with_trustee(mut self, trustee: Address, fee_bps: u128) -> Self {
        self.trustee_address = Some(trustee);
        self.trustee_fee_bps = fee_bps;
        self
    }

    /// Builder: set max supply diff
    pub fn with_max_supply_diff(mut self, diff: u128) -> Self {
        self.max_supply_diff = diff;
        self
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::InvalidParameter {
            name: "config".into(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        let state: Self =
            serde_json::from_str(&content).map_err(|e| Error::Deserialization(e.to_string()))?;
        state.validate()?;
        Ok(state)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::InvalidParameter {
                name: "config".into(),
                reason: e.to_string(),
            })?;
        }

        std::fs::write(path, content).map_err(|e| Error::InvalidParameter {
            name: "config".into(),
            reason: format!("{}: {}", path.display(), e),
        })
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Overlay `XUSD_*` environment variables onto this state
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str| -> Result<Option<u128>> {
            match lookup(key) {
                Some(raw) => raw.trim().parse::<u128>().map(Some).map_err(|e| {
                    Error::InvalidParameter {
                        name: key.into(),
                        reason: e.to_string(),
                    }
                }),
                None => Ok(None),
            }
        };

        if let Some(v) = parse(env::VAULT_BUFFER)? {
            self.vault_buffer = v;
        }
        if let Some(v) = parse(env::AUTO_ALLOCATE_THRESHOLD)? {
            self.auto_allocate_threshold = v;
        }
        if let Some(v) = parse(env::REBASE_THRESHOLD)? {
            self.rebase_threshold = v;
        }
        if let Some(v) = parse(env::REDEEM_FEE_BPS)? {
            self.redeem_fee_bps = v;
        }
        if let Some(v) = parse(env::TRUSTEE_FEE_BPS)? {
            self.trustee_fee_bps = v;
        }
        if let Some(v) = parse(env::MAX_SUPPLY_DIFF)? {
            self.max_supply_diff = v;
        }

        self.validate()
    }
}
