//! Per-provider runtime state: dispatch throttling and health flags.
//!
//! Implements a cooperative minimum-interval throttle. Each provider has
//! a single reserved dispatch slot; a caller claims the next slot under
//! the lock and then sleeps outside it until the slot arrives, so only
//! the invoking task ever waits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// Runtime state for a single provider.
#[derive(Clone, Copy, Debug)]
pub struct ProviderState {
    /// Reserved dispatch time of the most recent call, if any.
    pub last_call: Option<Instant>,
    /// Whether the most recent call succeeded. Providers start healthy.
    pub is_healthy: bool,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            last_call: None,
            is_healthy: true,
        }
    }
}

/// Thread-safe map of per-provider runtime state.
///
/// States are created on demand the first time a provider is throttled
/// or flagged.
pub struct ProviderStates {
    states: Mutex<HashMap<&'static str, ProviderState>>,
}

impl ProviderStates {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the state mutex, recovering from poison if necessary.
    ///
    /// The worst case after recovery is one mistimed dispatch or a stale
    /// health flag, both of which self-correct on the next call.
    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, ProviderState>> {
        self.states.lock().unwrap_or_else(|poisoned| {
            warn!("Provider state mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait until `provider_id` may be dispatched again.
    ///
    /// Claims the next dispatch slot under the lock: the slot is
    /// `last_call + min_interval`, or immediately for a provider that has
    /// never been called. Concurrent callers therefore serialize at
    /// `min_interval` spacing. A delayed call is never skipped.
    pub async fn throttle(&self, provider_id: &'static str, min_interval: Duration) {
        let wait = {
            let mut states = self.lock();
            let state = states.entry(provider_id).or_default();

            let now = Instant::now();
            let wait = match state.last_call {
                Some(last) => (last + min_interval).saturating_duration_since(now),
                None => Duration::ZERO,
            };

            state.last_call = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            debug!("Throttling '{}' for {:?}", provider_id, wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Flag a provider healthy after a successful call.
    pub fn mark_healthy(&self, provider_id: &'static str) {
        let mut states = self.lock();
        states.entry(provider_id).or_default().is_healthy = true;
    }

    /// Flag a provider unhealthy after a failed call.
    pub fn mark_unhealthy(&self, provider_id: &'static str) {
        let mut states = self.lock();
        states.entry(provider_id).or_default().is_healthy = false;
    }

    /// Current health flag for a provider. Providers that have never been
    /// called count as healthy.
    pub fn is_healthy(&self, provider_id: &str) -> bool {
        self.lock()
            .get(provider_id)
            .map_or(true, |state| state.is_healthy)
    }
}

impl Default for ProviderStates {
    fn default() -> Self {
        Self::new()
    }
}
