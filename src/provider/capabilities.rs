//! Provider capability declarations.
//!
//! Each adapter declares which resource kinds it serves. The aggregator
//! filters its failover chain per resource from these declarations.

use std::fmt;

/// The resource kinds the aggregation layer serves.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Resource {
    /// Ranked market entries for the top assets
    Markets,
    /// Market-wide aggregate metrics
    Global,
    /// Single-asset detail lookup
    Detail,
    /// Hourly OHLCV series for one symbol
    Ohlc,
    /// Fear & Greed index reading
    FearGreed,
}

impl Resource {
    /// Stable lowercase name, used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markets => "markets",
            Self::Global => "global",
            Self::Detail => "detail",
            Self::Ohlc => "ohlc",
            Self::FearGreed => "fear-greed",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes what a provider adapter can do.
///
/// Used by the aggregator to decide which adapters belong in the
/// failover chain for a given resource.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Resource kinds this provider serves.
    pub resources: &'static [Resource],
}

impl ProviderCapabilities {
    /// Whether this provider serves the given resource kind.
    pub fn serves(&self, resource: Resource) -> bool {
        self.resources.contains(&resource)
    }
}
