//! Core error types for routeforge.
//!
//! [`RouterError`] covers the whole taxonomy: registration-time failures that
//! abort boot, recoverable reverse-lookup failures, and cache and configuration
//! problems. A path that matches no route is *not* an error; matchers return
//! `None` for that.

use thiserror::Error;

/// The primary error type for routeforge.
#[derive(Error, Debug)]
pub enum RouterError {
    // ── Registration ─────────────────────────────────────────────────

    /// A path template could not be compiled.
    #[error("Invalid route path '{path}': {reason}")]
    InvalidRoutePath {
        /// The offending template.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two routes were registered under the same name.
    #[error("Duplicate route name: {0}")]
    DuplicateRouteName(String),

    // ── Lookup ───────────────────────────────────────────────────────

    /// A reverse lookup named a route that does not exist.
    #[error("Invalid route name: {0}")]
    InvalidRouteName(String),

    // ── Cache ────────────────────────────────────────────────────────

    /// A route snapshot was configured but could not be loaded.
    #[error("Failed to load route cache: {0}")]
    CacheLoad(String),

    /// A route snapshot could not be written.
    #[error("Failed to store route cache: {0}")]
    CacheStore(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error outside the cache path, such as writing command output.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RouterError {
    /// Shorthand for building an [`RouterError::InvalidRoutePath`].
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoutePath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors that should stop the process from serving.
    ///
    /// Malformed templates, duplicate names, and an unreadable snapshot all
    /// mean the route table cannot be trusted.
    pub const fn is_boot_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidRoutePath { .. } | Self::DuplicateRouteName(_) | Self::CacheLoad(_)
        )
    }
}

/// A convenience type alias for `Result<T, RouterError>`.
pub type RouterResult<T> = Result<T, RouterError>;
