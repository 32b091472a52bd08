//! The `route:cache` management command.
//!
//! Rebuilds the route table by discovery and writes its snapshot to disk, so
//! later boots can skip discovery.

use std::io::{self, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use routeforge_core::{RouterError, Settings};
use routeforge_routing::SnapshotFile;

use super::SharedLifecycle;
use crate::command::ManagementCommand;

/// Writes the route cache.
///
/// The destination is `--output` when given, otherwise the configured
/// `cache_path`.
pub struct RouteCacheCommand {
    lifecycle: SharedLifecycle,
}

impl RouteCacheCommand {
    /// Creates the command over a shared lifecycle.
    pub const fn new(lifecycle: SharedLifecycle) -> Self {
        Self { lifecycle }
    }
}

#[async_trait]
impl ManagementCommand for RouteCacheCommand {
    fn name(&self) -> &'static str {
        "route:cache"
    }

    fn help(&self) -> &'static str {
        "Discover all routes and write the route cache"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("output")
                .long("output")
                .short('o')
                .value_parser(clap::value_parser!(PathBuf))
                .help("Write the cache here instead of the configured cache path"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), RouterError> {
        let target = matches
            .get_one::<PathBuf>("output")
            .or(settings.cache_path.as_ref())
            .cloned()
            .ok_or_else(|| {
                RouterError::ConfigurationError(
                    "No cache location: pass --output or set cache_path".to_string(),
                )
            })?;

        let snapshot = self
            .lifecycle
            .lock()
            .await
            .write_cache_to(&SnapshotFile::new(&target))?;

        writeln!(
            io::stdout().lock(),
            "Route cache written to {} ({} routes)",
            target.display(),
            snapshot.len()
        )?;
        Ok(())
    }
}
