//! Integration tests for route snapshots and the cache lifecycle.
//!
//! Tests cover: snapshot round-trip equivalence, snapshot files on disk,
//! corrupt and missing caches, and settings-driven lifecycles.

use std::collections::HashMap;
use std::fs;

use routeforge_core::{RouterError, Settings};
use routeforge_routing::{
    CacheLifecycle, Collection, DiscoveryTable, HandlerRef, LifecycleState, Method,
    MiddlewareStage, PopulatedFrom, Route, Snapshot, SnapshotFile, SnapshotSource, UrlGenerator,
    UrlOptions,
};

fn sample_routes() -> Vec<Route> {
    vec![
        Route::get("/version", "version"),
        Route::new("/health", "health").with_methods([Method::Get, Method::Head]),
        Route::post("/login", "login")
            .secure(true)
            .middleware(MiddlewareStage::Matched, "throttle")
            .target("AuthController::login"),
        Route::get("/users/{id:\\d+}", "user.show").target("UserController::show"),
        Route::new("/posts/{slug}/{page?:\\d+}", "post.show")
            .with_methods([Method::Get, Method::Head]),
    ]
}

fn populated() -> Collection {
    let mut routes = Collection::new();
    routes.add_all(sample_routes()).unwrap();
    routes
}

type Resolution = Option<(String, HashMap<String, String>)>;

fn resolve(routes: &Collection, path: &str, method: Method) -> Resolution {
    routeforge_routing::Matcher::new(routes)
        .match_path(path, Some(method))
        .map(|m| (m.route.name().to_string(), m.params))
}

const SAMPLE_REQUESTS: [(&str, Method); 10] = [
    ("/version", Method::Get),
    ("/version", Method::Post),
    ("/health", Method::Head),
    ("/login", Method::Post),
    ("/users/17", Method::Get),
    ("/users/abc", Method::Get),
    ("/posts/hello", Method::Get),
    ("/posts/hello/4", Method::Head),
    ("/posts/hello/four", Method::Get),
    ("/missing", Method::Get),
];

// ═════════════════════════════════════════════════════════════════════
// 1. Snapshot round trip preserves every match result
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_snapshot_reload_matches_identically() {
    let discovered = populated();
    let snapshot = discovered.cacheable().unwrap();
    assert_eq!(snapshot.static_routes.values().map(|t| t.len()).sum::<usize>(), 4);
    assert_eq!(snapshot.dynamic.values().map(Vec::len).sum::<usize>(), 3);
    assert_eq!(snapshot.len(), 5);

    let json = snapshot.to_json().unwrap();
    let mut reloaded = Collection::new();
    reloaded.load_snapshot(Snapshot::from_json(&json).unwrap()).unwrap();

    let mut misses = 0;
    for (path, method) in SAMPLE_REQUESTS {
        let before = resolve(&discovered, path, method);
        let after = resolve(&reloaded, path, method);
        assert_eq!(before, after, "{method} {path}");
        if before.is_none() {
            misses += 1;
        }
    }
    assert!(misses >= 1);
}

#[test]
fn test_snapshot_reload_keeps_opaque_fields_and_names() {
    let reloaded = Collection::from_snapshot(populated().cacheable().unwrap(), false).unwrap();

    let login = reloaded.get_by_name("login").unwrap();
    assert!(login.is_secure());
    assert_eq!(
        login.middleware_for(MiddlewareStage::Matched),
        &[HandlerRef::new("throttle")]
    );
    assert_eq!(
        login.dispatch_target().map(HandlerRef::as_str),
        Some("AuthController::login")
    );

    let options = UrlOptions {
        host: "example.com".to_string(),
        ..UrlOptions::default()
    };
    let urls = UrlGenerator::new(&reloaded, options);
    let mut data = HashMap::new();
    data.insert("id", "9");
    assert_eq!(urls.path("user.show", &data).unwrap(), "/users/9");
    assert_eq!(
        urls.path("login", &HashMap::<&str, &str>::new()).unwrap(),
        "https://example.com/login"
    );
}

#[test]
fn test_second_snapshot_equals_first() {
    let first = populated().cacheable().unwrap();
    let second = Collection::from_snapshot(first.clone(), false)
        .unwrap()
        .cacheable()
        .unwrap();
    assert_eq!(first, second);
}

// ═════════════════════════════════════════════════════════════════════
// 2. Snapshot files
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_snapshot_file_has_four_tables() {
    let dir = tempfile::tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("routes.json"));
    file.store(&populated().cacheable().unwrap()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
    let keys: Vec<&String> = raw.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 5);
    for key in ["routes", "static", "dynamic", "named"] {
        assert!(raw.get(key).is_some(), "missing {key}");
    }
    assert_eq!(raw["trailing_slash"], false);
    assert_eq!(raw["static"]["GET"]["/version"], 0);
    assert!(raw["routes"]["3"]["regex"].as_str().unwrap().starts_with('^'));
}

#[test]
fn test_corrupt_cache_fails_setup_distinctly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.json");
    fs::write(&path, "{ not json").unwrap();

    let mut lifecycle = CacheLifecycle::new(false).with_snapshot_source(SnapshotFile::new(&path));
    let err = lifecycle.setup(false, true).unwrap_err();
    assert!(matches!(err, RouterError::CacheLoad(_)));
    assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);
}

#[test]
fn test_dangling_reference_in_cache_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("routes.json"));
    let mut snapshot = populated().cacheable().unwrap();
    snapshot.named.insert("ghost".to_string(), 1000);
    file.store(&snapshot).unwrap();

    let mut lifecycle = CacheLifecycle::new(false).with_snapshot_source(file);
    assert!(matches!(
        lifecycle.setup(false, true),
        Err(RouterError::CacheLoad(_))
    ));
}

#[test]
fn test_cache_written_under_other_trailing_slash_policy_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.json");

    let mut slashed = CacheLifecycle::new(true)
        .with_registrar(|routes: &mut Collection| {
            routes.add_all([Route::get("/about", "about"), Route::get("/team/{m}", "team")])
        })
        .with_snapshot_source(SnapshotFile::new(&path));
    let snapshot = slashed.write_cache().unwrap();
    assert!(snapshot.trailing_slash);

    let mut trimmed = CacheLifecycle::new(false).with_snapshot_source(SnapshotFile::new(&path));
    let err = trimmed.setup(false, true).unwrap_err();
    assert!(matches!(err, RouterError::CacheLoad(_)));
    assert!(err.to_string().contains("trailing_slash"));
    assert_eq!(trimmed.state(), LifecycleState::Uninitialized);

    // The same cache still boots a router using the policy it was built under.
    let mut matching = CacheLifecycle::new(true).with_snapshot_source(SnapshotFile::new(&path));
    matching.setup(false, true).unwrap();
    let routes = matching.collection();
    assert_eq!(resolve(&routes, "/about", Method::Get).unwrap().0, "about");
    assert_eq!(resolve(&routes, "/team/ada/", Method::Get).unwrap().1["m"], "ada");
}

// ═════════════════════════════════════════════════════════════════════
// 3. Settings-driven lifecycles
// ═════════════════════════════════════════════════════════════════════

fn discovery() -> DiscoveryTable {
    DiscoveryTable::new()
        .source("Site", || sample_routes()[..3].to_vec())
        .source("Content", || sample_routes()[3..].to_vec())
}

#[test]
fn test_cache_written_by_one_process_boots_another() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        cache_path: Some(dir.path().join("cache/routes.json")),
        sources: vec!["Site".to_string(), "Content".to_string()],
        use_cache: true,
        ..Settings::default()
    };

    let mut builder = CacheLifecycle::from_settings(&settings).with_discoverer(discovery());
    builder.write_cache().unwrap();
    let discovered = builder.collection();

    // No discoverer: booting can only succeed from the cache.
    let mut booted = CacheLifecycle::from_settings(&settings);
    booted.boot().unwrap();
    assert_eq!(booted.populated_from(), Some(PopulatedFrom::Cache));

    let cached = booted.collection();
    for (path, method) in SAMPLE_REQUESTS {
        assert_eq!(
            resolve(&discovered, path, method),
            resolve(&cached, path, method),
            "{method} {path}"
        );
    }
}

#[test]
fn test_boot_without_cache_preference_discovers() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        cache_path: Some(dir.path().join("routes.json")),
        sources: vec!["Site".to_string()],
        ..Settings::default()
    };

    let mut lifecycle = CacheLifecycle::from_settings(&settings).with_discoverer(discovery());
    lifecycle.boot().unwrap();
    assert_eq!(lifecycle.populated_from(), Some(PopulatedFrom::Discovery));
    assert_eq!(lifecycle.collection().len(), 3);
    assert!(!dir.path().join("routes.json").exists());
}
