//! Error types for the aggregation core.
//!
//! Two layers of failure exist:
//! - [`FetchError`]: a single adapter failed. The aggregator absorbs these,
//!   flips the adapter's health flag, and moves on to the next provider in
//!   the chain. They never reach the caller.
//! - [`AggregateError`]: the whole chain failed and no cached snapshot was
//!   available to fall back on. This is the only error a caller sees.

use thiserror::Error;

/// Errors raised by a single provider adapter.
///
/// Every variant is terminal for that adapter within the current
/// aggregation call: there are no in-call retries, only failover to the
/// next provider. A failed provider is tried again on the next call.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request to the provider timed out (fixed per-call timeout).
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("Upstream status: {provider} - HTTP {status}")]
    UpstreamStatus {
        /// The provider that returned the status
        provider: String,
        /// The HTTP status code
        status: u16,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Malformed response: {provider} - {reason}")]
    MalformedResponse {
        /// The provider that returned the body
        provider: String,
        /// Why decoding failed
        reason: String,
    },

    /// The provider returned a well-formed body that reports a failure
    /// (e.g. CryptoCompare's `Response: "Error"` envelope).
    #[error("Provider reported: {provider} - {message}")]
    ProviderReported {
        /// The provider that reported the failure
        provider: String,
        /// The failure message from the provider
        message: String,
    },

    /// The adapter does not serve this resource kind.
    /// Default trait method bodies return this.
    #[error("Not supported: {provider} does not serve {resource}")]
    NotSupported {
        /// The provider that was asked
        provider: String,
        /// The resource kind that was requested
        resource: String,
    },

    /// A network error occurred while communicating with the provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Errors surfaced by the aggregator to its callers.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// Every adapter in the chain failed and the cache slot for this
    /// resource was empty. A populated cache would have been served
    /// instead, however stale.
    #[error("All providers exhausted for {resource}")]
    AllProvidersExhausted {
        /// The resource kind that could not be served
        resource: String,
    },
}
