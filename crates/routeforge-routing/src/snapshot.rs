//! Serializable route-table snapshots.
//!
//! A [`Snapshot`] is the plain-data form of a populated
//! [`Collection`](crate::urls::collection::Collection). It carries every route
//! with its derived fields already computed, so loading one never recompiles
//! a path template. Snapshots are stored as JSON through a [`SnapshotSource`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use routeforge_core::{RouterError, RouterResult};

use crate::route::{HandlerRef, Method, MiddlewareStage, ParamSpec};

/// Identifies a route inside one snapshot.
pub type RouteId = usize;

/// The flat, serializable form of a compiled route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub path: String,
    pub name: String,
    pub methods: Vec<Method>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub middleware: BTreeMap<MiddlewareStage, Vec<HandlerRef>>,
    #[serde(default)]
    pub target: Option<HandlerRef>,
    pub is_static: bool,
    /// Source text of the anchored regex; absent for static routes.
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
}

/// All three route tables, with routes reduced to [`RouteRecord`]s.
///
/// Tables reference routes by id, so a route registered under several
/// methods is stored once. Static keys and regexes are normalized for the
/// recorded `trailing_slash` policy, and a snapshot only loads into a
/// collection using the same policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub routes: BTreeMap<RouteId, RouteRecord>,
    #[serde(rename = "static")]
    pub static_routes: BTreeMap<Method, BTreeMap<String, RouteId>>,
    pub dynamic: BTreeMap<Method, Vec<RouteId>>,
    pub named: BTreeMap<String, RouteId>,
    #[serde(default)]
    pub trailing_slash: bool,
}

impl Snapshot {
    /// Serializes the snapshot to compact JSON.
    pub fn to_json(&self) -> RouterResult<String> {
        serde_json::to_string(self).map_err(|e| RouterError::CacheStore(e.to_string()))
    }

    /// Serializes the snapshot to indented JSON.
    pub fn to_json_pretty(&self) -> RouterResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RouterError::CacheStore(e.to_string()))
    }

    /// Parses a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::CacheLoad`] if the text is not a valid snapshot.
    pub fn from_json(json: &str) -> RouterResult<Self> {
        serde_json::from_str(json).map_err(|e| RouterError::CacheLoad(e.to_string()))
    }

    /// Returns the number of routes in the snapshot.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the snapshot holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Somewhere a snapshot can be loaded from and stored to.
pub trait SnapshotSource: Send + Sync {
    /// Loads the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::CacheLoad`] if the snapshot is missing or corrupt.
    fn load(&self) -> RouterResult<Snapshot>;

    /// Stores a snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::CacheStore`] if the snapshot cannot be written.
    fn store(&self, snapshot: &Snapshot) -> RouterResult<()>;

    /// Describes the source for log output.
    fn describe(&self) -> String;
}

/// A snapshot kept in a JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Creates a file-backed source at `path`. Nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for SnapshotFile {
    fn load(&self) -> RouterResult<Snapshot> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            RouterError::CacheLoad(format!("cannot read {}: {e}", self.path.display()))
        })?;
        Snapshot::from_json(&contents).map_err(|e| match e {
            RouterError::CacheLoad(reason) => {
                RouterError::CacheLoad(format!("{}: {reason}", self.path.display()))
            }
            other => other,
        })
    }

    fn store(&self, snapshot: &Snapshot) -> RouterResult<()> {
        let json = snapshot.to_json_pretty()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                RouterError::CacheStore(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&self.path, json).map_err(|e| {
            RouterError::CacheStore(format!("cannot write {}: {e}", self.path.display()))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
