//! Utility modules for the XUSD vault.
//!
//! This module contains shared utilities used across the crate:
//! - Addresses and state hashes
//! - Fixed-point arithmetic and decimal normalisation
//! - Validation helpers
//! - Constants

pub mod address;
pub mod constants;
pub mod math;
pub mod validation;

pub use address::*;
pub use constants::*;
pub use math::*;
pub use validation::*;
