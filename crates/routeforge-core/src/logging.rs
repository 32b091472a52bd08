//! Logging integration for routeforge.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for scoping route-table
//! population runs.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug", "info",
/// "routeforge_routing=trace"). In debug mode a pretty, human-readable format
/// is used; otherwise a structured JSON format is used. If a subscriber is
/// already installed this is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one population of the route table.
///
/// `source` names where the routes come from ("cache" or "discovery").
///
/// # Examples
///
/// ```
/// use routeforge_core::logging::setup_span;
///
/// let span = setup_span("discovery");
/// let _guard = span.enter();
/// tracing::info!("populating routes");
/// ```
pub fn setup_span(source: &str) -> tracing::Span {
    tracing::info_span!("route_setup", source = source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = Settings {
            log_level: "not a [valid filter".to_string(),
            ..Settings::default()
        };
        setup_logging(&settings);
        setup_logging(&Settings::default());
    }

    #[test]
    fn test_setup_span_enters() {
        let span = setup_span("cache");
        let _guard = span.enter();
        tracing::debug!("inside span");
    }
}
