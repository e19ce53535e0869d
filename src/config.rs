//! Configuration for caskv
//!
//! Centralized configuration with sensible defaults.

/// Main configuration for a caskv client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Pool Configuration
    // -------------------------------------------------------------------------
    /// Max live connections the pool will hold
    pub max_connections: usize,

    /// How long an acquire blocks when the pool is exhausted (milliseconds)
    pub acquire_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // CAS Configuration
    // -------------------------------------------------------------------------
    /// Acceptance rule applied by the atomic set procedures
    pub cas_policy: CasPolicy,
}

/// Acceptance rule for a write token against the stored version.
///
/// Negative tokens force the write under either policy; the policy only
/// governs non-negative tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasPolicy {
    /// Accept when `token >= current`. The historical rule: a token the
    /// caller never observed, ahead of the stored version, is still accepted.
    Relaxed,

    /// Accept only when `token == current` (conventional compare-and-swap).
    Strict,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_connections: 16,
            acquire_timeout_ms: 5000,
            cas_policy: CasPolicy::Relaxed,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the maximum number of live pooled connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the acquire timeout (in milliseconds)
    pub fn acquire_timeout_ms(mut self, ms: u64) -> Self {
        self.config.acquire_timeout_ms = ms;
        self
    }

    /// Set the CAS acceptance policy
    pub fn cas_policy(mut self, policy: CasPolicy) -> Self {
        self.config.cas_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
