//! # routeforge
//!
//! A request-routing core: path templates compiled to anchored regexes, an
//! O(1) static table in front of an ordered dynamic table, reverse URL
//! generation, and a boot-time route cache.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `routeforge` to get everything, or on individual crates
//! for finer-grained control.
//!
//! ```
//! use routeforge::prelude::*;
//!
//! let mut lifecycle = CacheLifecycle::new(false).with_registrar(|routes: &mut Collection| {
//!     routes.add(Route::get("/users/{id:\\d+}", "user.show"))
//! });
//! lifecycle.boot().unwrap();
//!
//! let routes = lifecycle.collection();
//! let found = Matcher::new(&routes).match_path("/users/7", Some(Method::Get)).unwrap();
//! assert_eq!(found.param("id"), Some("7"));
//! ```

/// Errors, settings, settings loading, and logging.
pub use routeforge_core as core;

/// Routes, the path compiler, route tables, matching, reverse URLs, and caching.
#[cfg(feature = "routing")]
pub use routeforge_routing as routing;

/// Management commands (CLI).
#[cfg(feature = "cli")]
pub use routeforge_cli as cli;

pub use serde_json;
pub use tokio;
pub use tracing;

/// The types most applications touch.
pub mod prelude {
    pub use routeforge_core::{RouterError, RouterResult, Settings};

    #[cfg(feature = "routing")]
    pub use routeforge_routing::{
        CacheLifecycle, Collection, MatchedRoute, Matcher, Method, MiddlewareStage, Route,
        SnapshotFile, UrlGenerator, UrlOptions,
    };

    #[cfg(feature = "cli")]
    pub use routeforge_cli::{register_route_commands, CommandRegistry};
}
