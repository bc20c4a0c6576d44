use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fear & Greed index reading.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FearGreedIndex {
    /// Index value, 0 (extreme fear) to 100 (extreme greed)
    pub value: u8,

    /// Upstream label for the value (e.g. "Fear", "Extreme Greed")
    pub classification: String,

    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
}
