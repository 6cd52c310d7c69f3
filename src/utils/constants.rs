//! Protocol constants and magic numbers.
//!
//! All protocol-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// PRECISION CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Decimals of the internal USD value unit and of the receipt token
pub const VALUE_DECIMALS: u8 = 18;

/// Scale of the 18-decimal value unit (1.0 = 10^18)
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Basis points divisor (10000 = 100%)
pub const BPS_DIVISOR: u128 = 10_000;

/// Smallest decimals an asset may declare
pub const MIN_ASSET_DECIMALS: u8 = 1;

/// Largest decimals an asset may declare
pub const MAX_ASSET_DECIMALS: u8 = 30;

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIPT TOKEN CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Receipt token name
pub const TOKEN_NAME: &str = "XUSD";

/// Receipt token symbol
pub const TOKEN_SYMBOL: &str = "XUSD";

/// Receipt token decimals
pub const TOKEN_DECIMALS: u8 = VALUE_DECIMALS;

/// Credits per token when the ledger is created (1.0)
pub const INITIAL_CREDITS_PER_TOKEN: u128 = SCALE;

/// Burns may overshoot a balance by this many units without failing.
/// Absorbs credits <-> face rounding on full exits.
pub const BURN_ROUNDING_TOLERANCE: u128 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// REBASE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Yield (in value units) below which a rebase does nothing: 1 gwei of USD
pub const MIN_REBASE_CHANGE: u128 = 1_000_000_000;

/// Upper bound for `max_supply_diff` (100%)
pub const MAX_SUPPLY_DIFF_CAP: u128 = SCALE;

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT POLICY LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Vault buffer of 100%: everything stays in the vault
pub const MAX_VAULT_BUFFER: u128 = SCALE;

/// Maximum redeem fee (100%)
pub const MAX_REDEEM_FEE_BPS: u128 = BPS_DIVISOR;

/// Maximum trustee fee (100%)
pub const MAX_TRUSTEE_FEE_BPS: u128 = BPS_DIVISOR;

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// The $1 peg, 18 decimals
pub const PEG_PRICE: u128 = SCALE;

/// Plausibility ceiling for an oracle price: $1,000,000 per unit
pub const MAX_PRICE: u128 = 1_000_000 * SCALE;

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default vault buffer (0%: push everything to strategies)
pub const DEFAULT_VAULT_BUFFER: u128 = 0;

/// Default auto-allocate threshold: 25,000 USD
pub const DEFAULT_AUTO_ALLOCATE_THRESHOLD: u128 = 25_000 * SCALE;

/// Default rebase threshold: 1,000 USD
pub const DEFAULT_REBASE_THRESHOLD: u128 = 1_000 * SCALE;

/// Default redeem fee (0.5%)
pub const DEFAULT_REDEEM_FEE_BPS: u128 = 50;

/// Default trustee fee (0%)
pub const DEFAULT_TRUSTEE_FEE_BPS: u128 = 0;

/// Default max supply diff: disabled
pub const DEFAULT_MAX_SUPPLY_DIFF: u128 = 0;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum retained events before the oldest are pruned
pub const MAX_EVENTS: usize = 1000;

/// Length of an address in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Length of a state hash in bytes
pub const HASH_LENGTH: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_consistency() {
        assert_eq!(SCALE, 10u128.pow(VALUE_DECIMALS as u32));
        assert_eq!(INITIAL_CREDITS_PER_TOKEN, SCALE);
        assert_eq!(TOKEN_DECIMALS, VALUE_DECIMALS);
    }

    #[test]
    fn test_defaults_within_limits() {
        assert!(DEFAULT_VAULT_BUFFER <= MAX_VAULT_BUFFER);
        assert!(DEFAULT_REDEEM_FEE_BPS <= MAX_REDEEM_FEE_BPS);
        assert!(DEFAULT_TRUSTEE_FEE_BPS <= MAX_TRUSTEE_FEE_BPS);
        assert!(DEFAULT_MAX_SUPPLY_DIFF <= MAX_SUPPLY_DIFF_CAP);
    }

    #[test]
    fn test_decimal_range() {
        assert!(MIN_ASSET_DECIMALS <= 6);
        assert!(MAX_ASSET_DECIMALS >= 18);
        // 10^30 * 10^18 still fits in 256 bits for price math
        assert!(10u128.checked_pow(MAX_ASSET_DECIMALS as u32).is_some());
    }
}
