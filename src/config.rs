//! Fetch engine configuration.
//!
//! `FetchConfig` controls the identity and limits of a
//! [`FetchEngine`](crate::net::FetchEngine): the user agent it announces,
//! how many redirects it follows, how many times an exchange is attempted
//! when the connection breaks, and whether `file:` identifiers may be read.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use gosub_fetch::config::FetchConfig;
//! let cfg = FetchConfig::default();
//! assert_eq!(cfg.max_redirects, 10);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use gosub_fetch::config::FetchConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = FetchConfig::builder()
//!     .user_agent("Gosub/0.1")
//!     .max_redirects(5)
//!     .max_attempts(3)
//!     .file_access(false)
//!     .build()?; // returns Result<FetchConfig, ConfigError>
//! # Ok(()) }
//! ```

use std::fmt;

pub const DEFAULT_USER_AGENT: &str = "GosubFetch/1.0";

pub const HTTP_PORT: u16 = 80;
pub const HTTPS_PORT: u16 = 443;

/// Number of redirects followed before a load is abandoned.
pub const MAX_REDIRECTS: usize = 10;

/// Attempts per exchange, the first one included.
pub const MAX_REQUEST_ATTEMPTS: usize = 2;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Sent as the `User-Agent` request header
    pub user_agent: String,
    /// Redirect responses followed by a single load
    pub max_redirects: usize,
    /// Total attempts for one request/response exchange
    pub max_attempts: usize,
    /// Allow `file://` identifiers to be read from disk
    pub file_access: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: MAX_REDIRECTS,
            max_attempts: MAX_REQUEST_ATTEMPTS,
            file_access: true,
        }
    }
}

impl FetchConfig {
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug, Clone, Default)]
pub struct FetchConfigBuilder {
    inner: FetchConfig,
}

impl FetchConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut FetchConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn max_redirects(self, n: usize) -> Self { self.map(|c| c.max_redirects = n) }
    pub fn max_attempts(self, n: usize) -> Self { self.map(|c| c.max_attempts = n) }
    pub fn file_access(self, on: bool) -> Self { self.map(|c| c.file_access = on) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut FetchConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<FetchConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroAttempts,
    EmptyUserAgent,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroAttempts =>
                write!(f, "max_attempts must be at least 1"),
            ConfigError::EmptyUserAgent =>
                write!(f, "user_agent must not be empty"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &FetchConfig) -> Result<(), ConfigError> {
    if c.max_attempts == 0 {
        return Err(ConfigError::ZeroAttempts);
    }
    if c.user_agent.trim().is_empty() {
        return Err(ConfigError::EmptyUserAgent);
    }
    Ok(())
}
