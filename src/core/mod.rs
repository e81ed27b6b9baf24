//! Domain types, configuration and the overlap engine

pub mod cache;
pub mod config;
pub mod error;
pub mod holdings;
pub mod log;
pub mod overlap;
pub mod registry;

// Re-export main types for cleaner imports
pub use error::HoldingsError;
pub use holdings::{Holding, HoldingsSnapshot};
pub use overlap::{OverlapResult, OverlappingHolding, calculate_overlap};
pub use registry::{FundEntry, FundRegistry};
