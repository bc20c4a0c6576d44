//! Cryptick Market Aggregation Crate
//!
//! This crate provides multi-source cryptocurrency market data
//! aggregation with automatic failover, derived trading signals, and a
//! periodic push feed.
//!
//! # Overview
//!
//! The aggregation core supports:
//! - Six upstream providers: CoinGecko, CoinPaprika, CoinCap,
//!   CryptoCompare, Binance, and Alternative.me
//! - Capability-filtered, priority-ordered failover per resource
//! - Cooperative per-provider request throttling
//! - Staleness-tolerant last-known-good caching
//! - Deterministic technical indicators and composite signals
//! - A shared broadcast loop fanning out to bounded subscriber channels
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |    PriceFeed     | --> |    Aggregator    |  (failover + cache + health)
//! +------------------+     +------------------+
//!                                   |
//!                                   v
//!                           +------------------+
//!                           |  MarketProvider  |  (CoinGecko, CoinPaprika, ...)
//!                           +------------------+
//!                                   |
//!                                   v
//!                           +------------------+
//!                           |   MarketEntry    |  (normalized market data)
//!                           +------------------+
//!                                   |
//!                                   v
//!                           +------------------+
//!                           |     signals      |  (RSI, MACD, decision table)
//!                           +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Aggregator`] - Failover chain over the provider lineup
//! - [`MarketProvider`] - Capability-declaring adapter trait
//! - [`MarketEntry`] - Normalized per-asset market snapshot
//! - [`TradingSignal`] - Composite per-asset recommendation
//! - [`PriceFeed`] - Shared periodic broadcast loop
//! - [`Config`] - Environment-sourced runtime configuration

pub mod aggregator;
pub mod config;
pub mod errors;
pub mod feed;
pub mod models;
pub mod provider;
pub mod signals;

// Re-export aggregation types
pub use aggregator::{
    Aggregator, HealthReport, ProviderState, ProviderStates, SnapshotCache, DEFAULT_OHLC_LIMIT,
};

// Re-export configuration
pub use config::{Config, DEFAULT_FEED_INTERVAL_SECS};

// Re-export error types
pub use errors::{AggregateError, FetchError};

// Re-export feed types
pub use feed::{
    ConnectionState, PriceFeed, PriceUpdate, BROADCAST_TOP_N, FEED_CHANNEL_CAPACITY,
};

// Re-export all public types from models
pub use models::{
    Candle, CoinDetail, DataQuality, FearGreedIndex, GlobalMetrics, MarketEntry,
    MAX_SPARKLINE_POINTS,
};

// Re-export provider types
pub use provider::alternative_me::AlternativeMeProvider;
pub use provider::binance::BinanceProvider;
pub use provider::coincap::CoinCapProvider;
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::coinpaprika::CoinPaprikaProvider;
pub use provider::cryptocompare::CryptoCompareProvider;
pub use provider::{MarketProvider, ProviderCapabilities, Resource};

// Re-export signal types
pub use signals::{analyze, digest, RiskLevel, SignalAction, SignalDigest, TradingSignal};
