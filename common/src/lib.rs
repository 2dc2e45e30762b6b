//! Ratekeeper Common Types
//!
//! Currencies, amounts and net/gross prices shared by the rate store,
//! the converter and the refresh tooling.

pub mod monetary;
pub mod error;

pub use monetary::*;
pub use error::*;
