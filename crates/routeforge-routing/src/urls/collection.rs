//! The route registry.
//!
//! A [`Collection`] owns every registered [`Route`] and three tables derived
//! from them:
//!
//! - static: method -> exact path -> route, for O(1) lookups
//! - dynamic: method -> routes in registration order, scanned by regex
//! - named: name -> route, for reverse lookups
//!
//! The tables store route ids (registration indices) so a route registered
//! under several methods exists once. A collection is populated during boot
//! and then shared read-only, typically behind an `Arc`.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use routeforge_core::{RouterError, RouterResult};

use crate::route::{Method, Route};
use crate::snapshot::{RouteId, RouteRecord, Snapshot};
use crate::urls::compiler;

/// The three route tables plus the routes they index.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    routes: Vec<Arc<Route>>,
    static_routes: BTreeMap<Method, HashMap<String, RouteId>>,
    dynamic_routes: BTreeMap<Method, Vec<RouteId>>,
    named: HashMap<String, RouteId>,
    trailing_slash: bool,
}

impl Collection {
    /// Creates an empty collection that trims trailing slashes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection with the given trailing-slash policy.
    ///
    /// With `true`, paths always end in `/`; with `false`, they never do.
    /// The policy applies to registered templates and matched paths alike.
    pub fn with_trailing_slash(trailing_slash: bool) -> Self {
        Self {
            trailing_slash,
            ..Self::default()
        }
    }

    /// Returns the trailing-slash policy.
    pub const fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    /// Normalizes `path` with this collection's trailing-slash policy.
    pub fn normalize_path(&self, path: &str) -> String {
        compiler::normalize_path(path, self.trailing_slash)
    }

    /// Registers a route.
    ///
    /// The route is compiled under this collection's trailing-slash policy
    /// (a route compiled under the other policy is recompiled), then
    /// indexed into the static or dynamic table of each of its methods and
    /// into the named table. If a static route already occupies the same
    /// method and path, the earlier registration keeps it.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DuplicateRouteName`] if the name is taken and
    /// [`RouterError::InvalidRoutePath`] if the template does not compile.
    /// The collection is unchanged on error.
    pub fn add(&mut self, route: Route) -> RouterResult<()> {
        if self.named.contains_key(route.name()) {
            return Err(RouterError::DuplicateRouteName(route.name().to_string()));
        }
        let route = route.compile(self.trailing_slash)?;
        let id = self.routes.len();

        if route.is_static() {
            let key = self.normalize_path(route.path());
            for &method in route.methods() {
                match self.static_routes.entry(method).or_default().entry(key.clone()) {
                    Entry::Occupied(existing) => {
                        tracing::warn!(
                            route = route.name(),
                            shadowed_by = self.routes[*existing.get()].name(),
                            %method,
                            path = %key,
                            "static route shadowed by an earlier registration"
                        );
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(id);
                    }
                }
            }
        } else {
            for &method in route.methods() {
                self.dynamic_routes.entry(method).or_default().push(id);
            }
        }

        tracing::debug!(
            route = route.name(),
            path = route.path(),
            is_static = route.is_static(),
            "registered route"
        );
        self.named.insert(route.name().to_string(), id);
        self.routes.push(Arc::new(route));
        Ok(())
    }

    /// Registers several routes in order, stopping at the first error.
    pub fn add_all(&mut self, routes: impl IntoIterator<Item = Route>) -> RouterResult<()> {
        routes.into_iter().try_for_each(|route| self.add(route))
    }

    /// Returns the route registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidRouteName`] if no such route exists.
    pub fn get_by_name(&self, name: &str) -> RouterResult<&Arc<Route>> {
        self.named
            .get(name)
            .map(|&id| &self.routes[id])
            .ok_or_else(|| RouterError::InvalidRouteName(name.to_string()))
    }

    /// Returns `true` if a route is registered under `name`.
    pub fn has(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Looks up a static route by method and already-normalized path.
    pub fn get_static(&self, method: Method, path: &str) -> Option<&Arc<Route>> {
        self.static_routes
            .get(&method)
            .and_then(|table| table.get(path))
            .map(|&id| &self.routes[id])
    }

    /// Iterates the static table of `method` as `(normalized path, route)`.
    pub fn static_routes(&self, method: Method) -> impl Iterator<Item = (&str, &Arc<Route>)> + '_ {
        self.static_routes
            .get(&method)
            .into_iter()
            .flatten()
            .map(|(path, &id)| (path.as_str(), &self.routes[id]))
    }

    /// Iterates the dynamic table of `method` in registration order.
    pub fn dynamic_routes(&self, method: Method) -> impl Iterator<Item = &Arc<Route>> + '_ {
        self.dynamic_routes
            .get(&method)
            .into_iter()
            .flatten()
            .map(|&id| &self.routes[id])
    }

    /// Returns the methods that have a static table, in method order.
    pub fn static_methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.static_routes.keys().copied()
    }

    /// Returns the methods that have a dynamic table, in method order.
    pub fn dynamic_methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.dynamic_routes.keys().copied()
    }

    /// Returns every route indexed under `method`, static and dynamic, in
    /// registration order.
    pub fn routes_for(&self, method: Method) -> Vec<&Arc<Route>> {
        let mut ids: Vec<RouteId> = self
            .static_routes
            .get(&method)
            .into_iter()
            .flat_map(HashMap::values)
            .chain(self.dynamic_routes.get(&method).into_iter().flatten())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| &self.routes[id]).collect()
    }

    /// Returns all routes in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Produces a serializable snapshot of all three tables.
    ///
    /// Route records carry their derived fields, so loading the snapshot never
    /// recompiles a template.
    pub fn cacheable(&self) -> RouterResult<Snapshot> {
        let routes: BTreeMap<RouteId, RouteRecord> = self
            .routes
            .iter()
            .enumerate()
            .map(|(id, route)| route.to_record().map(|record| (id, record)))
            .collect::<RouterResult<_>>()?;

        Ok(Snapshot {
            routes,
            static_routes: self
                .static_routes
                .iter()
                .map(|(&method, table)| {
                    let table: BTreeMap<String, RouteId> =
                        table.iter().map(|(path, &id)| (path.clone(), id)).collect();
                    (method, table)
                })
                .collect(),
            dynamic: self.dynamic_routes.clone(),
            named: self
                .named
                .iter()
                .map(|(name, &id)| (name.clone(), id))
                .collect(),
            trailing_slash: self.trailing_slash,
        })
    }

    /// Replaces the contents of this collection with a snapshot.
    ///
    /// Tables are rebuilt directly from the snapshot: no template is
    /// recompiled and names are not re-checked for uniqueness. Route ids are
    /// renumbered in ascending snapshot-id order.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::CacheLoad`] if the snapshot was built under a
    /// different trailing-slash policy, a record is inconsistent, or a table
    /// references an id with no record. The collection is unchanged on error.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> RouterResult<()> {
        if snapshot.trailing_slash != self.trailing_slash {
            return Err(RouterError::CacheLoad(format!(
                "snapshot was built with trailing_slash = {}, but the router uses {}",
                snapshot.trailing_slash, self.trailing_slash
            )));
        }

        let mut remap = HashMap::with_capacity(snapshot.routes.len());
        let mut routes = Vec::with_capacity(snapshot.routes.len());
        for (old_id, record) in snapshot.routes {
            remap.insert(old_id, routes.len());
            routes.push(Arc::new(Route::from_record(record, self.trailing_slash)?));
        }

        let resolve = |id: RouteId| {
            remap.get(&id).copied().ok_or_else(|| {
                RouterError::CacheLoad(format!("table references unknown route id {id}"))
            })
        };

        let mut static_routes = BTreeMap::new();
        for (method, table) in snapshot.static_routes {
            let table = table
                .into_iter()
                .map(|(path, id)| resolve(id).map(|id| (path, id)))
                .collect::<RouterResult<HashMap<_, _>>>()?;
            static_routes.insert(method, table);
        }

        let mut dynamic_routes = BTreeMap::new();
        for (method, ids) in snapshot.dynamic {
            let ids = ids
                .into_iter()
                .map(resolve)
                .collect::<RouterResult<Vec<_>>>()?;
            dynamic_routes.insert(method, ids);
        }

        let named = snapshot
            .named
            .into_iter()
            .map(|(name, id)| resolve(id).map(|id| (name, id)))
            .collect::<RouterResult<HashMap<_, _>>>()?;

        self.routes = routes;
        self.static_routes = static_routes;
        self.dynamic_routes = dynamic_routes;
        self.named = named;
        Ok(())
    }

    /// Builds a collection from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot, trailing_slash: bool) -> RouterResult<Self> {
        let mut collection = Self::with_trailing_slash(trailing_slash);
        collection.load_snapshot(snapshot)?;
        Ok(collection)
    }
}
