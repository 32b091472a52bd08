//! # routeforge-routing
//!
//! The request-routing core: path templates are compiled into anchored
//! regexes, indexed into static, dynamic, and named tables, resolved against
//! incoming `(path, method)` pairs, and turned back into URLs by name. A
//! populated table can be snapshotted to disk and reloaded at boot without
//! recompiling anything.
//!
//! ## Modules
//!
//! - [`route`] - The route entity, HTTP methods, and middleware stages
//! - [`urls`] - Path compiler, route collection, matcher, and URL generator
//! - [`snapshot`] - Serializable route-table snapshots and their storage
//! - [`discovery`] - Route discoverers and registrars
//! - [`lifecycle`] - Boot-time population of the route table

pub mod discovery;
pub mod lifecycle;
pub mod route;
pub mod snapshot;
pub mod urls;

pub use discovery::{DiscoveryTable, RouteDiscoverer, RouteRegistrar};
pub use lifecycle::{CacheLifecycle, LifecycleState, PopulatedFrom};
pub use route::{HandlerRef, Method, MiddlewareStage, ParamSpec, Route};
pub use snapshot::{RouteRecord, Snapshot, SnapshotFile, SnapshotSource};
pub use urls::collection::Collection;
pub use urls::matcher::{MatchedRoute, Matcher};
pub use urls::reverse::{UrlGenerator, UrlOptions};
