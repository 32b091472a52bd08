//! # routeforge-core
//!
//! Error types, settings, and logging shared by every routeforge crate.
//! This crate knows nothing about routes; it provides the foundation the
//! routing and CLI crates build on.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and result alias
//! - [`settings`] - Router configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{RouterError, RouterResult};
pub use settings::Settings;
