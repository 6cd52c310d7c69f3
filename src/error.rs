//! Error types for the XUSD vault.
//!
//! This module defines all error types used throughout the vault engine,
//! providing clear and actionable error messages. Every failing operation
//! is atomic: the vault is left exactly as it was before the call.

use crate::utils::address::Address;
use thiserror::Error;

/// Result type alias for XUSD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure taxonomy used by callers that only need to know
/// which kind of thing went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input or unsupported asset/strategy
    Validation,
    /// Output below the caller's minimum
    Slippage,
    /// Caller lacks the required role, or re-entered the vault
    Authorization,
    /// An accounting or registry invariant would be broken
    InvariantViolation,
    /// A strategy or oracle misbehaved
    ExternalCollaborator,
    /// Arithmetic, serialization or lock failures
    Internal,
}

/// Main error type for the XUSD vault
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Asset Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Asset is not registered or not currently supported
    #[error("Unknown asset: {0}")]
    UnknownAsset(Address),

    /// Deposit asset is not supported by the vault
    #[error("Asset not supported: {0}")]
    UnsupportedAsset(Address),

    /// Asset is already supported
    #[error("Asset already supported: {0}")]
    AlreadySupported(Address),

    /// Asset still has a balance somewhere in the vault
    #[error("Asset {asset} still holds a balance of {balance}")]
    AssetBalanceNotZero {
        /// Asset being removed
        asset: Address,
        /// Outstanding balance in native units
        balance: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Strategy Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Strategy does not declare support for the asset
    #[error("Strategy {strategy} does not support asset {asset}")]
    StrategyDoesNotSupportAsset {
        /// Strategy identifier
        strategy: Address,
        /// Asset identifier
        asset: Address,
    },

    /// Strategy is already approved
    #[error("Strategy already approved: {0}")]
    AlreadyApproved(Address),

    /// Strategy is not approved
    #[error("Strategy not approved: {0}")]
    StrategyNotApproved(Address),

    /// Reallocation source is not an approved strategy
    #[error("Invalid from Strategy: {0}")]
    InvalidFromStrategy(Address),

    /// Reallocation target is not an approved strategy
    #[error("Invalid to Strategy: {0}")]
    InvalidToStrategy(Address),

    /// Reallocation target does not support one of the listed assets
    #[error("Asset unsupported by target strategy: {0}")]
    AssetUnsupported(Address),

    /// Strategy still holds funds and cannot be removed
    #[error("Strategy {strategy} still holds {balance} of {asset}")]
    BalanceNotZero {
        /// Strategy identifier
        strategy: Address,
        /// Asset with a remaining balance
        asset: Address,
        /// Remaining balance in native units
        balance: u128,
    },

    /// Strategy is still the default strategy for an asset
    #[error("Strategy {strategy} is the default strategy for {asset}")]
    StrategyIsDefault {
        /// Strategy identifier
        strategy: Address,
        /// Asset routed to the strategy
        asset: Address,
    },

    /// A strategy call failed
    #[error("Strategy {strategy} failed: {reason}")]
    Strategy {
        /// Strategy identifier
        strategy: Address,
        /// Failure description
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Oracle Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Oracle has no price for the asset
    #[error("No price available for asset {0}")]
    PriceUnavailable(Address),

    /// Oracle returned an implausible price
    #[error("Invalid price {price} for asset {asset}")]
    InvalidPrice {
        /// Asset identifier
        asset: Address,
        /// Reported 18-decimal price
        price: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Caller is not the governor
    #[error("Caller is not the Governor: {0}")]
    NotGovernor(Address),

    /// Strategy was asked to pay out to someone other than its vault
    #[error("Caller is not the Vault: {0}")]
    NotVault(Address),

    /// Vault was entered while an operation was already in progress
    #[error("Reentrant call")]
    Reentrancy,

    // ═══════════════════════════════════════════════════════════════════
    // Token Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Account balance too small for the requested operation
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Requested amount
        required: u128,
        /// Available amount
        available: u128,
    },

    /// Account is already rebasing
    #[error("Account has already opted in: {0}")]
    AlreadyRebasing(Address),

    /// Account is already non-rebasing
    #[error("Account has not opted in: {0}")]
    AlreadyNonRebasing(Address),

    // ═══════════════════════════════════════════════════════════════════
    // Vault Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Output fell below the caller's minimum
    #[error("Slippage: minimum {minimum}, actual {actual}")]
    Slippage {
        /// Caller supplied minimum
        minimum: u128,
        /// Amount that would have been received
        actual: u128,
    },

    /// Mint and redeem are paused
    #[error("Capital paused")]
    CapitalPaused,

    /// Neither the vault nor any strategy can cover a redemption
    #[error("Insufficient liquidity for {asset}: required {required}, available {available}")]
    InsufficientLiquidity {
        /// Asset that could not be sourced
        asset: Address,
        /// Amount required in native units
        required: u128,
        /// Amount that could be sourced
        available: u128,
    },

    /// Supply would drift from backing value by more than allowed
    #[error("Backing value drift {diff} exceeds maximum {max}")]
    MaxSupplyDiffExceeded {
        /// Relative drift, 18 decimals
        diff: u128,
        /// Configured maximum, 18 decimals
        max: u128,
    },

    /// Accounting invariant violated
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invalid parameter value
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Amount must be greater than zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Arithmetic overflow
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    /// Arithmetic underflow
    #[error("Arithmetic underflow in {operation}")]
    Underflow {
        /// Operation that underflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Lock poisoned
    #[error("Lock poisoned")]
    Lock,
}

impl Error {
    /// Check if this error is recoverable (user can retry with different params)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InsufficientBalance { .. }
                | Error::Slippage { .. }
                | Error::ZeroAmount
                | Error::InvalidParameter { .. }
                | Error::InsufficientLiquidity { .. }
                | Error::UnsupportedAsset(_)
        )
    }

    /// Check if this is a critical error that requires immediate attention
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Error::InvariantViolation(_)
                | Error::Overflow { .. }
                | Error::Underflow { .. }
                | Error::Internal(_)
                | Error::Lock
        )
    }

    /// Taxonomy bucket for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownAsset(_)
            | Error::UnsupportedAsset(_)
            | Error::AlreadySupported(_)
            | Error::StrategyDoesNotSupportAsset { .. }
            | Error::AlreadyApproved(_)
            | Error::StrategyNotApproved(_)
            | Error::InvalidFromStrategy(_)
            | Error::InvalidToStrategy(_)
            | Error::AssetUnsupported(_)
            | Error::InsufficientBalance { .. }
            | Error::AlreadyRebasing(_)
            | Error::AlreadyNonRebasing(_)
            | Error::CapitalPaused
            | Error::InvalidParameter { .. }
            | Error::ZeroAmount => ErrorCategory::Validation,

            Error::Slippage { .. } => ErrorCategory::Slippage,

            Error::NotGovernor(_) | Error::NotVault(_) | Error::Reentrancy => {
                ErrorCategory::Authorization
            }

            Error::AssetBalanceNotZero { .. }
            | Error::BalanceNotZero { .. }
            | Error::StrategyIsDefault { .. }
            | Error::InsufficientLiquidity { .. }
            | Error::MaxSupplyDiffExceeded { .. }
            | Error::InvariantViolation(_) => ErrorCategory::InvariantViolation,

            Error::Strategy { .. } | Error::PriceUnavailable(_) | Error::InvalidPrice { .. } => {
                ErrorCategory::ExternalCollaborator
            }

            Error::Overflow { .. }
            | Error::Underflow { .. }
            | Error::Serialization(_)
            | Error::Deserialization(_)
            | Error::Internal(_)
            | Error::Lock => ErrorCategory::Internal,
        }
    }

    /// Get error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Asset errors: 1xxx
            Error::UnknownAsset(_) => 1001,
            Error::UnsupportedAsset(_) => 1002,
            Error::AlreadySupported(_) => 1003,
            Error::AssetBalanceNotZero { .. } => 1004,

            // Strategy errors: 2xxx
            Error::StrategyDoesNotSupportAsset { .. } => 2001,
            Error::AlreadyApproved(_) => 2002,
            Error::StrategyNotApproved(_) => 2003,
            Error::InvalidFromStrategy(_) => 2004,
            Error::InvalidToStrategy(_) => 2005,
            Error::AssetUnsupported(_) => 2006,
            Error::BalanceNotZero { .. } => 2007,
            Error::StrategyIsDefault { .. } => 2008,
            Error::Strategy { .. } => 2009,

            // Oracle errors: 3xxx
            Error::PriceUnavailable(_) => 3001,
            Error::InvalidPrice { .. } => 3002,

            // Authorization errors: 4xxx
            Error::NotGovernor(_) => 4001,
            Error::NotVault(_) => 4002,
            Error::Reentrancy => 4003,

            // Validation errors: 5xxx
            Error::InvalidParameter { .. } => 5001,
            Error::ZeroAmount => 5002,
            Error::Overflow { .. } => 5003,
            Error::Underflow { .. } => 5004,
            Error::InsufficientBalance { .. } => 5005,
            Error::AlreadyRebasing(_) => 5006,
            Error::AlreadyNonRebasing(_) => 5007,

            // Vault errors: 6xxx
            Error::Slippage { .. } => 6001,
            Error::CapitalPaused => 6002,
            Error::InsufficientLiquidity { .. } => 6003,
            Error::MaxSupplyDiffExceeded { .. } => 6004,
            Error::InvariantViolation(_) => 6005,

            // Serialization errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,

            // Internal errors: 9xxx
            Error::Internal(_) => 9001,
            Error::Lock => 9002,
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let a = Address::from_label("asset");
        let codes = vec![
            Error::UnknownAsset(a).code(),
            Error::UnsupportedAsset(a).code(),
            Error::AlreadyApproved(a).code(),
            Error::BalanceNotZero { strategy: a, asset: a, balance: 1 }.code(),
            Error::PriceUnavailable(a).code(),
            Error::NotGovernor(a).code(),
            Error::Reentrancy.code(),
            Error::ZeroAmount.code(),
            Error::Slippage { minimum: 0, actual: 0 }.code(),
            Error::MaxSupplyDiffExceeded { diff: 0, max: 0 }.code(),
            Error::Internal("".into()).code(),
        ];

        let mut unique_codes = codes.clone();
        unique_codes.sort();
        unique_codes.dedup();

        assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    }

    #[test]
    fn test_error_display() {
        let err = Error::Slippage {
            minimum: 1000,
            actual: 500,
        };
        assert!(err.to_string().contains("1000"));
        assert!(err.to_string().contains("500"));

        let from = Address::from_label("strategy");
        assert!(Error::InvalidFromStrategy(from)
            .to_string()
            .starts_with("Invalid from Strategy"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Slippage { minimum: 1, actual: 0 }.is_recoverable());
        assert!(!Error::Internal("test".into()).is_recoverable());
    }

    #[test]
    fn test_is_critical() {
        assert!(Error::InvariantViolation("test".into()).is_critical());
        assert!(Error::Overflow { operation: "test".into() }.is_critical());
        assert!(!Error::ZeroAmount.is_critical());
    }

    #[test]
    fn test_categories() {
        let a = Address::from_label("x");
        assert_eq!(Error::NotGovernor(a).category(), ErrorCategory::Authorization);
        assert_eq!(Error::Reentrancy.category(), ErrorCategory::Authorization);
        assert_eq!(
            Error::MaxSupplyDiffExceeded { diff: 2, max: 1 }.category(),
            ErrorCategory::InvariantViolation
        );
        assert_eq!(
            Error::Strategy { strategy: a, reason: "down".into() }.category(),
            ErrorCategory::ExternalCollaborator
        );
        assert_eq!(Error::ZeroAmount.category(), ErrorCategory::Validation);
    }
}
