//! # XUSD Protocol
//!
//! Vault allocation and accounting engine for a rebasing, multi-asset
//! stablecoin. Users deposit supported stablecoins, receive XUSD, and the
//! vault pushes idle capital into yield strategies. Yield reaches holders
//! through rebases of the receipt token.
//!
//! ## Architecture
//!
//! - **Core**: Parameters, the asset registry and the rebasing receipt token
//! - **Strategy**: The strategy contract, its registry and an in-memory venue
//! - **Oracle**: Mint and redeem price feeds
//! - **Vault**: Mint/redeem, allocation, rebasing and governance
//! - **Events**: Bounded log of everything the vault did
//! - **CLI**: Scenario simulator and output rendering
//!
//! ## Example
//!
//! ```rust,ignore
//! use xusd::prelude::*;
//!
//! let dai = Address::from_label("DAI");
//! let oracle = Arc::new(FixedPriceOracle::pegged(&[dai]));
//! let mut vault = Vault::new(vault_address, governor, oracle);
//! vault.support_asset(&governor, dai, "DAI", 18)?;
//!
//! let minted = vault.mint(&alice, &dai, 100 * SCALE, 0)?;
//! vault.rebase()?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod cli;
pub mod core;
pub mod error;
pub mod events;
pub mod oracle;
pub mod strategy;
pub mod utils;
pub mod vault;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        asset::{Asset, AssetRegistry},
        config::VaultState,
        token::{Holding, RebaseState, ReceiptToken},
    };
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventLog, VaultEvent};
    pub use crate::oracle::{
        price_feed::{FixedPriceOracle, PriceData},
        PriceOracle,
    };
    pub use crate::strategy::{InMemoryStrategy, Strategy, StrategyRef, StrategyRegistry};
    pub use crate::utils::{
        address::{Address, Hash},
        constants::SCALE,
        math::FixedPoint,
    };
    pub use crate::vault::{
        AllocationOutcome, RebaseOutcome, RedeemOutcome, Vault, VaultHandle, VaultStatus,
    };
    pub use std::sync::Arc;
}

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name
pub const PROTOCOL_NAME: &str = "XUSD";
