//! Configuration Module
//!
//! Handles loading proxy and cache configuration from environment variables
//! and the command line. Everything is fixed at process start.

use std::env;
use std::time::Duration;

/// Recommended total cache budget in bytes.
pub const DEFAULT_CACHE_CAPACITY: usize = 1_049_000;

/// Recommended largest cacheable object in bytes.
pub const DEFAULT_MAX_OBJECT_SIZE: usize = 102_400;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Total cache byte budget
    pub cache_capacity: usize,
    /// Largest single object the cache will admit
    pub max_object_size: usize,
    /// Port the forwarding proxy listens on
    pub proxy_port: u16,
    /// Port of the admin HTTP API
    pub admin_port: u16,
    /// Read/write timeout on origin connections, in seconds
    pub upstream_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Total cache bytes (default: 1049000)
    /// - `MAX_OBJECT_SIZE` - Largest cacheable object in bytes (default: 102400)
    /// - `PROXY_PORT` - Proxy listening port (default: 8080)
    /// - `ADMIN_PORT` - Admin API port (default: 3000)
    /// - `UPSTREAM_TIMEOUT_SECS` - Origin socket timeout (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            max_object_size: parse_var("MAX_OBJECT_SIZE").unwrap_or(defaults.max_object_size),
            proxy_port: parse_var("PROXY_PORT").unwrap_or(defaults.proxy_port),
            admin_port: parse_var("ADMIN_PORT").unwrap_or(defaults.admin_port),
            upstream_timeout: parse_var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or(defaults.upstream_timeout),
        }
    }

    /// Applies command line arguments on top of the environment.
    ///
    /// The only accepted argument is the proxy listening port.
    pub fn with_args<I>(mut self, args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        if let Some(port) = args.next() {
            self.proxy_port = port
                .parse()
                .map_err(|_| format!("invalid port: {}", port))?;
        }
        if let Some(extra) = args.next() {
            return Err(format!("unexpected argument: {}", extra));
        }
        Ok(self)
    }

    /// Checks that the cache limits are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache capacity must be non-zero".to_string());
        }
        if self.max_object_size == 0 {
            return Err("max object size must be non-zero".to_string());
        }
        if self.max_object_size > self.cache_capacity {
            return Err(format!(
                "max object size {} exceeds cache capacity {}",
                self.max_object_size, self.cache_capacity
            ));
        }
        Ok(())
    }

    /// Origin socket timeout as a Duration.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
            proxy_port: 8080,
            admin_port: 3000,
            upstream_timeout: 30,
        }
    }
}
