//! Checkout tuning knobs.
//!
//! The binary fills these from command-line flags (with environment fallbacks);
//! library users construct them directly.

use std::time::Duration;

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PERSIST_ATTEMPTS: u32 = 3;
pub const DEFAULT_PERSIST_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Upper bound on each gateway round-trip (token or sale).
    pub gateway_timeout: Duration,
    /// How many times an order insert is tried after a successful charge.
    pub persist_attempts: u32,
    /// Pause between order insert attempts.
    pub persist_backoff: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            persist_attempts: DEFAULT_PERSIST_ATTEMPTS,
            persist_backoff: DEFAULT_PERSIST_BACKOFF,
        }
    }
}

impl CheckoutConfig {
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// At least one attempt is always made.
    pub fn with_persist_attempts(mut self, attempts: u32) -> Self {
        self.persist_attempts = attempts.max(1);
        self
    }

    pub fn with_persist_backoff(mut self, backoff: Duration) -> Self {
        self.persist_backoff = backoff;
        self
    }
}
