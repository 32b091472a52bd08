//! Boot-time population of the route table.
//!
//! A [`CacheLifecycle`] owns the process's [`Collection`] and decides how to
//! fill it: from a stored [`Snapshot`], or by running discovery over the
//! configured sources followed by every registrar. Once populated, the
//! collection is published as an `Arc` and never mutated again; a later
//! forced setup builds a fresh collection and swaps the handle.
//!
//! ```text
//! Uninitialized --setup()--> Populated --setup(force)--> Populated
//! ```

use std::fmt;
use std::sync::Arc;

use routeforge_core::logging::setup_span;
use routeforge_core::{RouterError, RouterResult, Settings};

use crate::discovery::{RouteDiscoverer, RouteRegistrar};
use crate::route::Method;
use crate::snapshot::{Snapshot, SnapshotFile, SnapshotSource};
use crate::urls::collection::Collection;

/// Where a lifecycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Populated,
}

/// How the current collection was populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulatedFrom {
    Cache,
    Discovery,
}

impl PopulatedFrom {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Discovery => "discovery",
        }
    }
}

/// Owns the route table and its population.
///
/// # Examples
///
/// ```
/// use routeforge_routing::lifecycle::{CacheLifecycle, LifecycleState};
/// use routeforge_routing::route::Route;
/// use routeforge_routing::urls::collection::Collection;
///
/// let mut lifecycle = CacheLifecycle::new(false).with_registrar(|routes: &mut Collection| {
///     routes.add(Route::get("/version", "version"))
/// });
/// lifecycle.setup(false, false).unwrap();
///
/// assert_eq!(lifecycle.state(), LifecycleState::Populated);
/// assert!(lifecycle.collection().has("version"));
/// ```
pub struct CacheLifecycle {
    state: LifecycleState,
    populated_from: Option<PopulatedFrom>,
    collection: Arc<Collection>,
    trailing_slash: bool,
    use_cache: bool,
    sources: Vec<String>,
    discoverer: Option<Box<dyn RouteDiscoverer>>,
    registrars: Vec<Box<dyn RouteRegistrar>>,
    snapshot_source: Option<Box<dyn SnapshotSource>>,
}

impl fmt::Debug for CacheLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLifecycle")
            .field("state", &self.state)
            .field("populated_from", &self.populated_from)
            .field("routes", &self.collection.len())
            .field("trailing_slash", &self.trailing_slash)
            .field("use_cache", &self.use_cache)
            .field("sources", &self.sources)
            .field("registrars", &self.registrars.len())
            .field(
                "snapshot_source",
                &self.snapshot_source.as_ref().map(|source| source.describe()),
            )
            .finish_non_exhaustive()
    }
}

impl CacheLifecycle {
    /// Creates an uninitialized lifecycle with no collaborators.
    pub fn new(trailing_slash: bool) -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            populated_from: None,
            collection: Arc::new(Collection::with_trailing_slash(trailing_slash)),
            trailing_slash,
            use_cache: false,
            sources: Vec::new(),
            discoverer: None,
            registrars: Vec::new(),
            snapshot_source: None,
        }
    }

    /// Creates a lifecycle configured from settings.
    ///
    /// Picks up the trailing-slash policy, the default cache preference, the
    /// discovery sources, and a [`SnapshotFile`] at `cache_path` when one is
    /// set. The discoverer and registrars still have to be supplied.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut lifecycle = Self::new(settings.trailing_slash).with_sources(settings.sources.clone());
        lifecycle.use_cache = settings.use_cache;
        if let Some(path) = &settings.cache_path {
            lifecycle.snapshot_source = Some(Box::new(SnapshotFile::new(path)));
        }
        lifecycle
    }

    /// Sets the discoverer run once per source.
    #[must_use]
    pub fn with_discoverer(mut self, discoverer: impl RouteDiscoverer + 'static) -> Self {
        self.discoverer = Some(Box::new(discoverer));
        self
    }

    /// Appends discovery sources.
    #[must_use]
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Appends a registrar. Registrars run after discovery, in the order they
    /// were added.
    #[must_use]
    pub fn with_registrar(mut self, registrar: impl RouteRegistrar + 'static) -> Self {
        self.registrars.push(Box::new(registrar));
        self
    }

    /// Sets where snapshots are loaded from and written to.
    #[must_use]
    pub fn with_snapshot_source(mut self, source: impl SnapshotSource + 'static) -> Self {
        self.snapshot_source = Some(Box::new(source));
        self
    }

    /// Returns the current state.
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Returns how the current collection was populated, once populated.
    pub const fn populated_from(&self) -> Option<PopulatedFrom> {
        self.populated_from
    }

    /// Returns the configured cache preference used by [`boot`](Self::boot).
    pub const fn use_cache(&self) -> bool {
        self.use_cache
    }

    /// Returns the configured discovery sources.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Returns a handle to the current collection.
    ///
    /// Before the first setup this is an empty collection.
    pub fn collection(&self) -> Arc<Collection> {
        Arc::clone(&self.collection)
    }

    /// Populates the collection.
    ///
    /// Does nothing if already populated, unless `force` is set. With
    /// `use_cache` and a snapshot source, the snapshot is loaded and
    /// discovery is skipped; with `use_cache` but no snapshot source,
    /// discovery runs instead. Discovery starts from an empty collection,
    /// asks the discoverer for each source in order, then runs every
    /// registrar.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::CacheLoad`] if the snapshot cannot be loaded,
    /// or whatever discovery and registration report. On error the previous
    /// collection and state are kept.
    pub fn setup(&mut self, force: bool, use_cache: bool) -> RouterResult<()> {
        if self.state == LifecycleState::Populated && !force {
            return Ok(());
        }

        let snapshot_source = self.snapshot_source.as_deref().filter(|_| use_cache);
        let from = if snapshot_source.is_some() {
            PopulatedFrom::Cache
        } else {
            PopulatedFrom::Discovery
        };
        let span = setup_span(from.as_str());
        let _guard = span.enter();

        let collection = match snapshot_source {
            Some(source) => self.load_cached(source)?,
            None => {
                if use_cache {
                    tracing::debug!("no snapshot source configured, running discovery");
                }
                self.discover()?
            }
        };

        self.collection = Self::finalize(collection);
        self.state = LifecycleState::Populated;
        self.populated_from = Some(from);
        Ok(())
    }

    /// Runs [`setup`](Self::setup) without forcing, using the configured cache
    /// preference.
    pub fn boot(&mut self) -> RouterResult<()> {
        self.setup(false, self.use_cache)
    }

    /// Rebuilds the collection by discovery and returns its snapshot.
    ///
    /// The snapshot always reflects a fresh discovery run, never a previously
    /// loaded cache.
    pub fn cacheable(&mut self) -> RouterResult<Snapshot> {
        self.setup(true, false)?;
        self.collection.cacheable()
    }

    /// Rebuilds the collection by discovery and stores its snapshot through
    /// the configured snapshot source.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ConfigurationError`] if no snapshot source is
    /// configured, and [`RouterError::CacheStore`] if the write fails.
    pub fn write_cache(&mut self) -> RouterResult<Snapshot> {
        let snapshot = self.cacheable()?;
        let source = self.snapshot_source.as_deref().ok_or_else(|| {
            RouterError::ConfigurationError("no route cache location configured".to_string())
        })?;
        Self::store(source, &snapshot)?;
        Ok(snapshot)
    }

    /// Rebuilds the collection by discovery and stores its snapshot at
    /// `target`.
    pub fn write_cache_to(&mut self, target: &dyn SnapshotSource) -> RouterResult<Snapshot> {
        let snapshot = self.cacheable()?;
        Self::store(target, &snapshot)?;
        Ok(snapshot)
    }

    fn store(target: &dyn SnapshotSource, snapshot: &Snapshot) -> RouterResult<()> {
        target.store(snapshot)?;
        tracing::info!(
            location = %target.describe(),
            routes = snapshot.len(),
            "route cache written"
        );
        Ok(())
    }

    fn load_cached(&self, source: &dyn SnapshotSource) -> RouterResult<Collection> {
        tracing::debug!(source = %source.describe(), "loading route snapshot");
        let snapshot = source.load()?;
        Collection::from_snapshot(snapshot, self.trailing_slash)
    }

    fn discover(&self) -> RouterResult<Collection> {
        let mut routes = Collection::with_trailing_slash(self.trailing_slash);

        match &self.discoverer {
            Some(discoverer) => {
                for source in &self.sources {
                    let found = discoverer.routes(source)?;
                    tracing::debug!(source = %source, routes = found.len(), "discovered routes");
                    routes.add_all(found)?;
                }
            }
            None if !self.sources.is_empty() => {
                tracing::warn!(
                    sources = self.sources.len(),
                    "route sources configured without a discoverer; skipping them"
                );
            }
            None => {}
        }

        for registrar in &self.registrars {
            registrar.register(&mut routes)?;
        }
        Ok(routes)
    }

    /// Publishes a populated collection.
    fn finalize(collection: Collection) -> Arc<Collection> {
        let static_count = collection.routes().iter().filter(|r| r.is_static()).count();
        let methods: Vec<Method> = Method::ALL
            .into_iter()
            .filter(|&method| !collection.routes_for(method).is_empty())
            .collect();
        tracing::info!(
            routes = collection.len(),
            static_routes = static_count,
            dynamic_routes = collection.len() - static_count,
            methods = ?methods,
            "route table populated"
        );
        Arc::new(collection)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::discovery::DiscoveryTable;
    use crate::route::Route;
    use crate::urls::matcher::Matcher;

    fn table() -> DiscoveryTable {
        DiscoveryTable::new()
            .source("Users", || {
                vec![Route::get("/users", "user.index"), Route::get("/users/{id}", "user.show")]
            })
            .source("Status", || vec![Route::get("/version", "version")])
    }

    #[test]
    fn test_setup_discovers_in_source_order() {
        let mut lifecycle = CacheLifecycle::new(false)
            .with_discoverer(table())
            .with_sources(["Status", "Users"]);
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);
        lifecycle.setup(false, false).unwrap();

        let routes = lifecycle.collection();
        let names: Vec<&str> = routes.routes().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["version", "user.index", "user.show"]);
        assert_eq!(lifecycle.populated_from(), Some(PopulatedFrom::Discovery));
    }

    #[test]
    fn test_setup_is_idempotent_without_force() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut lifecycle = CacheLifecycle::new(false).with_registrar(move |routes: &mut Collection| {
            counter.fetch_add(1, Ordering::SeqCst);
            routes.add(Route::get("/ping", "ping"))
        });

        lifecycle.setup(false, false).unwrap();
        let first = lifecycle.collection();
        lifecycle.setup(false, false).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &lifecycle.collection()));

        lifecycle.setup(true, false).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&first, &lifecycle.collection()));
        // Readers keep the table they were handed.
        assert!(first.has("ping"));
    }

    #[test]
    fn test_registrars_run_after_discovery() {
        let mut lifecycle = CacheLifecycle::new(false)
            .with_discoverer(table())
            .with_sources(["Status"])
            .with_registrar(|routes: &mut Collection| routes.add(Route::get("/a", "a")))
            .with_registrar(|routes: &mut Collection| routes.add(Route::get("/b", "b")));
        lifecycle.setup(false, false).unwrap();
        let names: Vec<String> = lifecycle
            .collection()
            .routes()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["version", "a", "b"]);
    }

    #[test]
    fn test_failed_discovery_keeps_previous_state() {
        let mut lifecycle = CacheLifecycle::new(false)
            .with_discoverer(table())
            .with_sources(["Status", "Missing"]);
        assert!(lifecycle.setup(false, false).is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);
        assert!(lifecycle.collection().is_empty());
    }

    #[test]
    fn test_duplicate_name_aborts_setup() {
        let mut lifecycle = CacheLifecycle::new(false)
            .with_discoverer(table())
            .with_sources(["Status"])
            .with_registrar(|routes: &mut Collection| routes.add(Route::post("/v", "version")));
        let err = lifecycle.setup(false, false).unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRouteName(_)));
        assert!(err.is_boot_failure());
    }

    #[test]
    fn test_use_cache_without_source_falls_back_to_discovery() {
        let mut lifecycle = CacheLifecycle::new(false)
            .with_discoverer(table())
            .with_sources(["Status"]);
        lifecycle.setup(false, true).unwrap();
        assert_eq!(lifecycle.populated_from(), Some(PopulatedFrom::Discovery));
        assert!(lifecycle.collection().has("version"));
    }

    #[test]
    fn test_cache_roundtrip_skips_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("routes.json");

        let mut writer = CacheLifecycle::new(false)
            .with_discoverer(table())
            .with_sources(["Users", "Status"])
            .with_snapshot_source(SnapshotFile::new(&file));
        let snapshot = writer.write_cache().unwrap();
        assert_eq!(snapshot.len(), 3);

        let mut reader = CacheLifecycle::new(false).with_snapshot_source(SnapshotFile::new(&file));
        reader.setup(false, true).unwrap();
        assert_eq!(reader.populated_from(), Some(PopulatedFrom::Cache));

        let routes = reader.collection();
        let m = Matcher::new(&routes).match_path("/users/5", Some(Method::Get)).unwrap();
        assert_eq!(m.param("id"), Some("5"));
    }

    #[test]
    fn test_missing_cache_fails_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let mut lifecycle = CacheLifecycle::new(false)
            .with_discoverer(table())
            .with_sources(["Status"])
            .with_snapshot_source(SnapshotFile::new(dir.path().join("absent.json")));

        assert!(matches!(
            lifecycle.setup(false, true),
            Err(RouterError::CacheLoad(_))
        ));
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);

        // Callers may fall back to discovery.
        lifecycle.setup(false, false).unwrap();
        assert!(lifecycle.collection().has("version"));
    }

    #[test]
    fn test_cacheable_forces_fresh_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("routes.json");
        SnapshotFile::new(&file).store(&Snapshot::default()).unwrap();

        let mut lifecycle = CacheLifecycle::new(false)
            .with_discoverer(table())
            .with_sources(["Status"])
            .with_snapshot_source(SnapshotFile::new(&file));
        lifecycle.setup(false, true).unwrap();
        assert!(lifecycle.collection().is_empty());

        let snapshot = lifecycle.cacheable().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(lifecycle.populated_from(), Some(PopulatedFrom::Discovery));
    }

    #[test]
    fn test_write_cache_requires_location() {
        let mut lifecycle = CacheLifecycle::new(false);
        assert!(matches!(
            lifecycle.write_cache(),
            Err(RouterError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            trailing_slash: true,
            use_cache: true,
            sources: vec!["Users".to_string()],
            cache_path: Some("/tmp/routeforge-test-routes.json".into()),
            ..Settings::default()
        };
        let lifecycle = CacheLifecycle::from_settings(&settings);
        assert!(lifecycle.use_cache());
        assert_eq!(lifecycle.sources(), &["Users".to_string()]);
        assert!(lifecycle.collection().trailing_slash());
        assert!(format!("{lifecycle:?}").contains("routeforge-test-routes.json"));
    }
}
