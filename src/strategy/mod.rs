//! Yield strategies.
//!
//! A strategy is an external position the vault pushes capital into. The
//! vault only relies on the `Strategy` contract below; concrete lending
//! venues live outside this crate. `InMemoryStrategy` is the in-crate
//! reference implementation used by tests and the simulator.
//!
//! ## Contract
//!
//! - `deposit` is called after the vault has released `amount` of `asset`
//!   to the strategy
//! - `withdraw` and `withdraw_all` pay out to `recipient`, which must be the
//!   vault the strategy is bound to
//! - `check_balance` reports the strategy's position in native units

pub mod memory;
pub mod registry;

pub use memory::*;
pub use registry::*;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::utils::address::Address;

/// Shared handle to a strategy
pub type StrategyRef = Arc<dyn Strategy>;

/// A yield-bearing position the vault can allocate into
pub trait Strategy: Send + Sync + fmt::Debug {
    /// Strategy identifier
    fn id(&self) -> Address;

    /// Take custody of `amount` of `asset`
    fn deposit(&self, asset: &Address, amount: u128) -> Result<()>;

    /// Pay `amount` of `asset` out to `recipient`
    fn withdraw(&self, recipient: &Address, asset: &Address, amount: u128) -> Result<()>;

    /// Pay out everything, best-effort per asset. Returns what was paid.
    fn withdraw_all(&self, recipient: &Address) -> Result<Vec<(Address, u128)>>;

    /// Position in `asset`, native units
    fn check_balance(&self, asset: &Address) -> Result<u128>;

    /// Part of the position that can be withdrawn right now
    fn liquid_balance(&self, asset: &Address) -> Result<u128> {
        self.check_balance(asset)
    }

    /// Whether the strategy accepts `asset`
    fn supports_asset(&self, asset: &Address) -> bool;

    /// All assets the strategy accepts
    fn supported_assets(&self) -> Vec<Address>;
}
