//! Aggregation module.
//!
//! This module orchestrates the provider lineup, including:
//! - Capability-filtered, priority-ordered failover chains
//! - Cooperative per-provider throttling
//! - Health flag tracking and the health probe
//! - The last-known-good snapshot cache

mod aggregator;
mod cache;
mod state;

pub use aggregator::{Aggregator, HealthReport, DEFAULT_OHLC_LIMIT};
pub use cache::SnapshotCache;
pub use state::{ProviderState, ProviderStates};
