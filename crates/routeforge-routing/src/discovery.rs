//! Collaborators that supply routes to a lifecycle.
//!
//! A [`RouteDiscoverer`] produces the routes declared by one source (a
//! controller, module, or generated table). A [`RouteRegistrar`] adds
//! hand-written routes straight to the collection being built. Both are
//! implemented for plain closures.

use std::collections::HashMap;
use std::fmt;

use routeforge_core::{RouterError, RouterResult};

use crate::route::Route;
use crate::urls::collection::Collection;

/// Produces the routes declared by a source.
pub trait RouteDiscoverer: Send + Sync {
    /// Returns the routes of `source`, ready to be added to a collection.
    fn routes(&self, source: &str) -> RouterResult<Vec<Route>>;
}

impl<F> RouteDiscoverer for F
where
    F: Fn(&str) -> RouterResult<Vec<Route>> + Send + Sync,
{
    fn routes(&self, source: &str) -> RouterResult<Vec<Route>> {
        self(source)
    }
}

/// Adds routes to a collection imperatively.
pub trait RouteRegistrar: Send + Sync {
    /// Registers routes on `routes`.
    fn register(&self, routes: &mut Collection) -> RouterResult<()>;
}

impl<F> RouteRegistrar for F
where
    F: Fn(&mut Collection) -> RouterResult<()> + Send + Sync,
{
    fn register(&self, routes: &mut Collection) -> RouterResult<()> {
        self(routes)
    }
}

/// A discoverer backed by a fixed table of route factories per source.
///
/// Each factory is called on every discovery run, so the table can be
/// consulted any number of times.
///
/// # Examples
///
/// ```
/// use routeforge_routing::discovery::{DiscoveryTable, RouteDiscoverer};
/// use routeforge_routing::route::Route;
///
/// let table = DiscoveryTable::new()
///     .source("UserController", || vec![Route::get("/users", "user.index")]);
///
/// assert_eq!(table.routes("UserController").unwrap().len(), 1);
/// assert!(table.routes("Missing").is_err());
/// ```
#[derive(Default)]
pub struct DiscoveryTable {
    sources: HashMap<String, Box<dyn Fn() -> Vec<Route> + Send + Sync>>,
}

impl fmt::Debug for DiscoveryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.sources.keys().collect();
        names.sort();
        f.debug_struct("DiscoveryTable")
            .field("sources", &names)
            .finish()
    }
}

impl DiscoveryTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the routes of `name`.
    #[must_use]
    pub fn source<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Vec<Route> + Send + Sync + 'static,
    {
        self.sources.insert(name.into(), Box::new(factory));
        self
    }

    /// Returns `true` if `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }
}

impl RouteDiscoverer for DiscoveryTable {
    fn routes(&self, source: &str) -> RouterResult<Vec<Route>> {
        self.sources
            .get(source)
            .map(|factory| factory())
            .ok_or_else(|| RouterError::ConfigurationError(format!("Unknown route source: {source}")))
    }
}
