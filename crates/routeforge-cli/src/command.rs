//! Management commands for inspecting and caching the route table.
//!
//! Every command implements [`ManagementCommand`] and is dispatched by a
//! [`CommandRegistry`], which turns the registered commands into `clap`
//! subcommands of the `routeforge` binary. The built-in `route:cache` and
//! `route:list` commands share one
//! [`CacheLifecycle`](routeforge_routing::CacheLifecycle) and are added with
//! [`register_route_commands`](crate::commands::register_route_commands).
//! Settings reach each command through [`ManagementCommand::handle`], so the
//! same registry serves a cached and an uncached deployment.
//!
//! Failures come back as [`RouterError`]; [`exit_code`] turns the outcome of
//! [`CommandRegistry::run_with_args`] into the process exit status.
//!
//! ## Adding a route command
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use routeforge_cli::command::ManagementCommand;
//! use routeforge_core::{RouterError, Settings};
//!
//! struct RouteSourcesCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for RouteSourcesCommand {
//!     fn name(&self) -> &str { "route:sources" }
//!     fn help(&self) -> &str { "List the configured discovery sources" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         settings: &Settings,
//!     ) -> Result<(), RouterError> {
//!         for source in &settings.sources {
//!             println!("{source}");
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::ffi::OsString;
use std::process::ExitCode;

use async_trait::async_trait;
use routeforge_core::{RouterError, RouterResult, Settings};

/// A management command that can be registered and invoked through the CLI.
///
/// All commands must be `Send + Sync` so a registry can be shared between
/// tasks.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// Returns the name of this command (used to invoke it from the CLI).
    fn name(&self) -> &str;

    /// Returns a short help description for this command.
    fn help(&self) -> &str;

    /// Adds custom arguments to the clap command.
    ///
    /// The default implementation returns the command unchanged.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Executes the command with the given argument matches and settings.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings)
        -> Result<(), RouterError>;
}

/// A registry of management commands.
///
/// Commands are registered by name and can be looked up, listed, or executed.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates a new empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a management command.
    ///
    /// If a command with the same name already exists, it is replaced.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        let name = command.name().to_string();
        self.commands.insert(name, command);
    }

    /// Returns a reference to the command with the given name, if registered.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns a sorted list of all registered command names.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds a top-level clap `Command` containing all registered subcommands.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("routeforge")
            .about("routeforge route management utility")
            .subcommand_required(true);

        let mut entries: Vec<_> = self.commands.iter().collect();
        entries.sort_by_key(|(name, _)| (*name).clone());

        for (name, cmd) in entries {
            // clap wants &'static str names; commands are registered once at startup.
            let static_name: &'static str = Box::leak(name.clone().into_boxed_str());
            let subcmd = clap::Command::new(static_name).about(cmd.help().to_string());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }

        app
    }

    /// Executes the command identified by the given argument matches.
    pub async fn execute(&self, matches: &clap::ArgMatches, settings: &Settings) -> RouterResult<()> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
            RouterError::ConfigurationError("No subcommand specified".to_string())
        })?;

        let cmd = self.get(name).ok_or_else(|| {
            RouterError::ConfigurationError(format!("Unknown command: {name}"))
        })?;

        tracing::debug!(command = name, "running management command");
        cmd.handle(sub_matches, settings).await
    }

    /// Parses `args` (program name first) and runs the selected command.
    ///
    /// # Errors
    ///
    /// Argument errors are reported as [`RouterError::ConfigurationError`];
    /// command failures are returned unchanged.
    pub async fn run_with_args<I, T>(&self, settings: &Settings, args: I) -> RouterResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .build_cli()
            .try_get_matches_from(args)
            .map_err(|e| RouterError::ConfigurationError(e.to_string()))?;
        self.execute(&matches, settings).await
    }
}

/// Maps a command outcome to a process exit code, logging failures.
pub fn exit_code(result: &RouterResult<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "management command failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestCommand {
        cmd_name: String,
    }

    impl TestCommand {
        fn new(name: &str) -> Self {
            Self {
                cmd_name: name.to_string(),
            }
        }
    }

    #[async_trait]
    impl ManagementCommand for TestCommand {
        fn name(&self) -> &str {
            &self.cmd_name
        }

        fn help(&self) -> &'static str {
            "A test command"
        }

        fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
            cmd.arg(
                clap::Arg::new("verbose")
                    .long("verbose")
                    .action(clap::ArgAction::SetTrue),
            )
        }

        async fn handle(
            &self,
            _matches: &clap::ArgMatches,
            _settings: &Settings,
        ) -> Result<(), RouterError> {
            Ok(())
        }
    }

    struct FailingCommand;

    #[async_trait]
    impl ManagementCommand for FailingCommand {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn help(&self) -> &'static str {
            "A command that always fails"
        }

        async fn handle(
            &self,
            _matches: &clap::ArgMatches,
            _settings: &Settings,
        ) -> Result<(), RouterError> {
            Err(RouterError::CacheStore("disk full".to_string()))
        }
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(CommandRegistry::default().is_empty());
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(TestCommand::new("route:test")));
        assert_eq!(registry.len(), 1);

        let cmd = registry.get("route:test").unwrap();
        assert_eq!(cmd.name(), "route:test");
        assert_eq!(cmd.help(), "A test command");
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_list_commands_sorted() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(TestCommand::new("zebra")));
        registry.register(Box::new(TestCommand::new("alpha")));
        registry.register(Box::new(TestCommand::new("middle")));
        assert_eq!(registry.list_commands(), vec!["alpha", "middle", "zebra"]);
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(TestCommand::new("test")));
        registry.register(Box::new(TestCommand::new("test")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_build_cli_with_arguments() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(TestCommand::new("test")));

        let matches = registry
            .build_cli()
            .try_get_matches_from(["routeforge", "test", "--verbose"])
            .unwrap();
        let (name, sub_matches) = matches.subcommand().unwrap();
        assert_eq!(name, "test");
        assert!(sub_matches.get_flag("verbose"));
    }

    #[tokio::test]
    async fn test_run_with_args_success() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(TestCommand::new("test")));
        let result = registry
            .run_with_args(&Settings::default(), ["routeforge", "test"])
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_with_args_failing_command() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(FailingCommand));
        let result = registry
            .run_with_args(&Settings::default(), ["routeforge", "fail"])
            .await;
        assert!(matches!(result, Err(RouterError::CacheStore(_))));
    }

    #[tokio::test]
    async fn test_unknown_subcommand_is_configuration_error() {
        let registry = CommandRegistry::new();
        let result = registry
            .run_with_args(&Settings::default(), ["routeforge", "route:nope"])
            .await;
        assert!(matches!(result, Err(RouterError::ConfigurationError(_))));
    }

    #[test]
    fn test_exit_code_is_success_only_for_ok() {
        assert_eq!(format!("{:?}", exit_code(&Ok(()))), format!("{:?}", ExitCode::SUCCESS));
        let failed = exit_code(&Err(RouterError::CacheStore("x".to_string())));
        assert_eq!(format!("{failed:?}"), format!("{:?}", ExitCode::FAILURE));
    }
}
