//! Core primitives for the Whalescope project.

/// Display formatting for addresses and amounts
pub mod format;
/// Wei scale constants and unit conversions
pub mod units;

pub use units::WEI_PER_ETH;
