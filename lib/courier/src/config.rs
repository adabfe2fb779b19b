//! Transport configuration types.
//!
//! Request-level settings (timeout, headers, base address) live in
//! [`RequestConfig`](crate::RequestConfig). [`TransportConfig`] only covers the
//! connection pool shared by every request of one [`HyperTransport`](crate::HyperTransport).

use std::time::Duration;

/// Connection settings for [`HyperTransport`](crate::HyperTransport).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound on dialing a new connection, TLS handshake included.
    pub connect_timeout: Duration,
    /// Idle connections kept in the pool for each host.
    pub pool_idle_per_host: usize,
    /// How long a pooled connection may stay unused before it is closed.
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl TransportConfig {
    /// Start from the defaults and override selected settings.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl TransportConfigBuilder {
    /// Override [`TransportConfig::connect_timeout`].
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Override [`TransportConfig::pool_idle_per_host`].
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Override [`TransportConfig::pool_idle_timeout`].
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Finish, taking the default for every setting left untouched.
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
        }
    }
}
