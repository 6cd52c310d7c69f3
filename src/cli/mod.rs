//! XUSD command line support.
//!
//! The binary is a thin shell over these modules: `scenario` scripts a
//! vault run from JSON and `output` renders the results.

pub mod output;
pub mod scenario;

pub use output::*;
pub use scenario::*;
