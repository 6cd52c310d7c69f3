//! Core modules for the XUSD vault.
//!
//! This module contains the fundamental building blocks:
//! - Vault configuration (governable parameters)
//! - Supported asset registry
//! - Rebasing receipt token ledger

pub mod asset;
pub mod config;
pub mod token;

pub use asset::*;
pub use config::*;
pub use token::*;
