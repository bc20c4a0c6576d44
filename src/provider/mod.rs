//! Provider adapter abstractions and implementations.
//!
//! This module contains:
//! - The `MarketProvider` trait that all adapters implement
//! - Capability declarations used to build per-resource failover chains
//! - Concrete adapters, one per upstream API
//!
//! # Architecture
//!
//! Adapters are deliberately dumb: each one wraps exactly one upstream
//! API, translates that upstream's response shape into the canonical
//! models, and reports failures as [`crate::errors::FetchError`]. All
//! chain ordering, health bookkeeping, throttling, and caching live in
//! the aggregator, so adding a provider means adding one module here and
//! registering it, never touching branch logic elsewhere.

mod capabilities;
mod traits;

// Provider implementations
pub mod alternative_me;
pub mod binance;
pub mod coincap;
pub mod coingecko;
pub mod coinpaprika;
pub mod cryptocompare;

// Re-exports
pub use capabilities::{ProviderCapabilities, Resource};
pub use traits::MarketProvider;
