//! The `route:list` management command.
//!
//! Prints the populated route table, grouped by method and in registration
//! order within each method.

use std::io::{self, Write};

use async_trait::async_trait;
use routeforge_core::{RouterError, RouterResult, Settings};
use routeforge_routing::{Collection, Method};

use super::SharedLifecycle;
use crate::command::ManagementCommand;

/// Prints the route table.
pub struct RouteListCommand {
    lifecycle: SharedLifecycle,
}

impl RouteListCommand {
    /// Creates the command over a shared lifecycle.
    pub const fn new(lifecycle: SharedLifecycle) -> Self {
        Self { lifecycle }
    }
}

struct Row<'a> {
    method: Method,
    path: &'a str,
    name: &'a str,
    kind: &'static str,
    target: &'a str,
}

fn rows(routes: &Collection, only: Option<Method>) -> Vec<Row<'_>> {
    Method::ALL
        .into_iter()
        .filter(|method| only.map_or(true, |only| only == *method))
        .flat_map(|method| {
            routes.routes_for(method).into_iter().map(move |route| Row {
                method,
                path: route.path(),
                name: route.name(),
                kind: if route.is_static() { "static" } else { "dynamic" },
                target: route.dispatch_target().map_or("", |t| t.as_str()),
            })
        })
        .collect()
}

/// Renders the table as aligned text columns.
///
/// With `only`, just that method's routes are listed.
pub fn render_route_table(routes: &Collection, only: Option<Method>) -> String {
    let rows = rows(routes, only);
    if rows.is_empty() {
        return "No routes registered.\n".to_string();
    }

    let headers = ["METHOD", "PATH", "NAME", "KIND", "TARGET"];
    let cells: Vec<[&str; 5]> = rows
        .iter()
        .map(|row| [row.method.as_str(), row.path, row.name, row.kind, row.target])
        .collect();

    let mut widths = headers.map(str::len);
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    for line in std::iter::once(&headers).chain(&cells) {
        let padded: Vec<String> = line
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// Renders the table as a JSON array of route objects.
pub fn render_route_json(routes: &Collection, only: Option<Method>) -> Result<String, RouterError> {
    let entries: Vec<serde_json::Value> = rows(routes, only)
        .into_iter()
        .map(|row| {
            serde_json::json!({
                "method": row.method,
                "path": row.path,
                "name": row.name,
                "kind": row.kind,
                "target": row.target,
            })
        })
        .collect();
    serde_json::to_string_pretty(&entries).map_err(|e| RouterError::SerializationError(e.to_string()))
}

/// Writes the listing to `out`, as JSON when `json` is set.
///
/// # Errors
///
/// Returns [`RouterError::IoError`] if `out` cannot be written.
pub fn write_route_listing(
    out: &mut impl Write,
    routes: &Collection,
    only: Option<Method>,
    json: bool,
) -> RouterResult<()> {
    if json {
        writeln!(out, "{}", render_route_json(routes, only)?)?;
    } else {
        write!(out, "{}", render_route_table(routes, only))?;
    }
    out.flush()?;
    Ok(())
}

#[async_trait]
impl ManagementCommand for RouteListCommand {
    fn name(&self) -> &'static str {
        "route:list"
    }

    fn help(&self) -> &'static str {
        "List all registered routes"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("method")
                .long("method")
                .short('m')
                .help("Only list routes answering this HTTP method"),
        )
        .arg(
            clap::Arg::new("json")
                .long("json")
                .action(clap::ArgAction::SetTrue)
                .help("Print the table as JSON"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        _settings: &Settings,
    ) -> Result<(), RouterError> {
        let only = matches
            .get_one::<String>("method")
            .map(|m| m.parse::<Method>())
            .transpose()?;

        let routes = {
            let mut lifecycle = self.lifecycle.lock().await;
            lifecycle.boot()?;
            lifecycle.collection()
        };

        write_route_listing(&mut io::stdout().lock(), &routes, only, matches.get_flag("json"))
    }
}
