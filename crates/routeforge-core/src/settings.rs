//! Router settings.
//!
//! [`Settings`] holds every configuration input the routing core reads. There
//! is no global instance: the boot sequence loads a `Settings`
//! value (see [`settings_loader`](crate::settings_loader)) and hands it to the
//! constructors that need it.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The complete set of router settings.
///
/// # Examples
///
/// ```
/// use routeforge_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.trailing_slash);
/// assert!(settings.cache_path.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log filter directive (e.g. "info", "routeforge_routing=debug").
    pub log_level: String,

    // ── URLs ─────────────────────────────────────────────────────────

    /// When `true`, every path is normalized to end in `/`; when `false`,
    /// trailing slashes are trimmed. Applies to registration, matching, and
    /// URL generation alike.
    pub trailing_slash: bool,
    /// Always generate absolute URLs.
    pub always_absolute: bool,
    /// Host (optionally `host:port`) used when generating absolute URLs.
    pub host: String,

    // ── Route cache ──────────────────────────────────────────────────

    /// Whether boot should prefer the route snapshot over discovery.
    pub use_cache: bool,
    /// Where the route snapshot lives. `None` means no cache is configured.
    pub cache_path: Option<PathBuf>,

    // ── Discovery ────────────────────────────────────────────────────

    /// Sources (controller names) handed to the route discoverer, in order.
    pub sources: Vec<String>,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),

            trailing_slash: false,
            always_absolute: false,
            host: String::new(),

            use_cache: false,
            cache_path: None,

            sources: Vec::new(),

            extra: HashMap::new(),
        }
    }
}
