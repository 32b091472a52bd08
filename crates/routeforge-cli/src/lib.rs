//! # routeforge-cli
//!
//! Management commands for the routeforge routing core.
//!
//! This crate provides:
//!
//! - **Command framework** - [`ManagementCommand`] and [`CommandRegistry`],
//!   which build a `clap` command tree and dispatch to async handlers
//! - **Route commands** - `route:cache` writes the route snapshot used to
//!   skip discovery at boot; `route:list` prints the populated table
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use routeforge_cli::command::CommandRegistry;
//! use routeforge_cli::commands::register_route_commands;
//! use routeforge_routing::CacheLifecycle;
//! use tokio::sync::Mutex;
//!
//! let lifecycle = Arc::new(Mutex::new(CacheLifecycle::new(false)));
//! let mut registry = CommandRegistry::new();
//! register_route_commands(&mut registry, &lifecycle);
//!
//! assert_eq!(registry.list_commands(), vec!["route:cache", "route:list"]);
//! ```

// - doc_markdown: backtick requirements for documentation items are too strict
// - module_name_repetitions: re-exports make module-prefixed names redundant
// - significant_drop_tightening: lifecycle guards are held for the whole operation
// - unused_async: command handlers keep a uniform async signature
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;

pub use command::{exit_code, CommandRegistry, ManagementCommand};
pub use commands::{register_route_commands, RouteCacheCommand, RouteListCommand, SharedLifecycle};
