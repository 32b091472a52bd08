//! Forward resolution: `(path, method)` to a route and its parameters.
//!
//! Resolution runs in two tiers. The static table is probed first with a
//! single hash lookup; on a miss, the dynamic routes for the method are tried
//! in registration order and the first regex that matches wins. There is no
//! specificity scoring, so registration order is the only tie-break between
//! overlapping dynamic routes.
//!
//! A miss is `None`, never an error: deciding between "not found" and
//! "method not allowed" is left to the caller, helped by
//! [`Matcher::allowed_methods`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::route::{Method, Route};
use crate::urls::collection::Collection;

/// A successful match.
#[derive(Clone)]
pub struct MatchedRoute {
    /// The matched route.
    pub route: Arc<Route>,
    /// Captured parameters by name. Optional parameters that were absent are
    /// not present in the map.
    pub params: HashMap<String, String>,
}

impl fmt::Debug for MatchedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchedRoute")
            .field("route", &self.route.name())
            .field("params", &self.params)
            .finish()
    }
}

impl MatchedRoute {
    /// Returns the value captured for `name`, if any.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the matched route's name.
    pub fn name(&self) -> &str {
        self.route.name()
    }
}

/// Resolves paths against a [`Collection`].
///
/// The matcher borrows the collection and is cheap to create, so callers
/// usually build one per lookup batch.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    routes: &'a Collection,
}

impl<'a> Matcher<'a> {
    /// Creates a matcher over `routes`.
    pub const fn new(routes: &'a Collection) -> Self {
        Self { routes }
    }

    /// Resolves `path` for `method`.
    ///
    /// The path is normalized with the collection's trailing-slash policy.
    /// With `method = None` every method is considered: all static tables
    /// first, then all dynamic tables, each in method order.
    pub fn match_path(&self, path: &str, method: Option<Method>) -> Option<MatchedRoute> {
        let path = self.routes.normalize_path(path);
        self.static_lookup(&path, method)
            .or_else(|| self.dynamic_scan(&path, method))
    }

    /// Resolves `path` against the static table only.
    pub fn match_static(&self, path: &str, method: Option<Method>) -> Option<MatchedRoute> {
        self.static_lookup(&self.routes.normalize_path(path), method)
    }

    /// Resolves `path` against the dynamic table only.
    pub fn match_dynamic(&self, path: &str, method: Option<Method>) -> Option<MatchedRoute> {
        self.dynamic_scan(&self.routes.normalize_path(path), method)
    }

    /// Returns every method under which `path` resolves, in method order.
    ///
    /// An empty result means the path is unknown; a non-empty result that
    /// lacks the request's method means the method is not allowed.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let path = self.routes.normalize_path(path);
        Method::ALL
            .into_iter()
            .filter(|&method| {
                self.static_lookup(&path, Some(method)).is_some()
                    || self.dynamic_scan(&path, Some(method)).is_some()
            })
            .collect()
    }

    fn static_lookup(&self, path: &str, method: Option<Method>) -> Option<MatchedRoute> {
        let found = match method {
            Some(method) => self.routes.get_static(method, path),
            None => self
                .routes
                .static_methods()
                .find_map(|method| self.routes.get_static(method, path)),
        }?;
        Some(MatchedRoute {
            route: Arc::clone(found),
            params: HashMap::new(),
        })
    }

    fn dynamic_scan(&self, path: &str, method: Option<Method>) -> Option<MatchedRoute> {
        let scan = |method: Method| {
            self.routes.dynamic_routes(method).find_map(|route| {
                let params = route.compiled()?.captures(path)?;
                Some(MatchedRoute {
                    route: Arc::clone(route),
                    params,
                })
            })
        };
        match method {
            Some(method) => scan(method),
            None => self.routes.dynamic_methods().find_map(scan),
        }
    }
}
