//! Built-in route management commands.
//!
//! Each command implements the
//! [`ManagementCommand`](crate::command::ManagementCommand) trait and shares
//! one [`CacheLifecycle`] with the others, so a table populated by one
//! command is visible to the next.

pub mod route_cache;
pub mod route_list;

use std::sync::Arc;

use routeforge_routing::CacheLifecycle;
use tokio::sync::Mutex;

pub use route_cache::RouteCacheCommand;
pub use route_list::{render_route_json, render_route_table, write_route_listing, RouteListCommand};

use crate::command::CommandRegistry;

/// A lifecycle shared between commands.
pub type SharedLifecycle = Arc<Mutex<CacheLifecycle>>;

/// Registers `route:cache` and `route:list` against `lifecycle`.
pub fn register_route_commands(registry: &mut CommandRegistry, lifecycle: &SharedLifecycle) {
    registry.register(Box::new(RouteCacheCommand::new(Arc::clone(lifecycle))));
    registry.register(Box::new(RouteListCommand::new(Arc::clone(lifecycle))));
}
