//! Route discovery against real directories.

use routedir::routing::{load_routes, RouteMethod};
use routedir::{handler, Config, Endpoints, LoadError, ModuleExports, ModuleRegistry};

mod common;
use common::{empty, AppDir};

fn patterns(config: Config, registry: &ModuleRegistry) -> Vec<String> {
    let table = load_routes(&config.resolve(), registry).expect("routes load");
    table
        .routes()
        .iter()
        .map(|r| format!("{} {}", r.method, r.pattern()))
        .collect()
}

#[test]
fn test_missing_routes_directory() {
    let app = AppDir::without_routes();
    let err = load_routes(&app.config().resolve(), &ModuleRegistry::new()).unwrap_err();
    assert!(matches!(err, LoadError::RoutesDirectoryMissing(_)));
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_invalid_method_names_file_and_key() {
    let app = AppDir::new().route_files(&["widgets.ts"]);
    let registry = ModuleRegistry::new().with("widgets.ts", || {
        Endpoints::new().route("FOO /bar", handler(empty))
    });

    let err = load_routes(&app.config().resolve(), &registry).unwrap_err();
    match &err {
        LoadError::InvalidMethod { file, key } => {
            assert_eq!(file, "widgets.ts");
            assert_eq!(key, "FOO /bar");
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("widgets.ts") && message.contains("FOO /bar"));
}

#[test]
fn test_key_without_space_is_malformed() {
    let app = AppDir::new().route_files(&["widgets.rs"]);
    let registry = ModuleRegistry::new().with("widgets.rs", || Endpoints::new().route("GET", handler(empty)));

    let err = load_routes(&app.config().resolve(), &registry).unwrap_err();
    assert!(matches!(err, LoadError::MalformedEndpointKey { .. }));
}

#[test]
fn test_unregistered_route_file_fails() {
    let app = AppDir::new().route_files(&["orphan.rs"]);
    let err = load_routes(&app.config().resolve(), &ModuleRegistry::new()).unwrap_err();
    assert!(matches!(err, LoadError::ModuleNotRegistered { ref file } if file == "orphan.rs"));
}

#[test]
fn test_patterns_are_normalized() {
    let app = AppDir::new().route_files(&["index.rs", "users.rs", "admin.ts", "README.md", "data.json"]);
    let registry = ModuleRegistry::new()
        .with("index.rs", || Endpoints::new().get("/", handler(empty)).get("health", handler(empty)))
        .with("users.rs", || {
            Endpoints::new()
                .get("/", handler(empty))
                .get("/:id", handler(empty))
                .post("//", handler(empty))
        })
        .with("admin.ts", || {
            Endpoints::new()
                .prefix("/v1/")
                .suffix("tools")
                .delete("/:id", handler(empty))
        });

    assert_eq!(
        patterns(app.config(), &registry),
        [
            "DELETE /v1/admin/tools/:id",
            "GET /",
            "GET /health",
            "GET /users",
            "GET /users/:id",
            "POST /users",
        ]
    );
}

#[test]
fn test_trailing_slash_is_kept_from_sub_pattern() {
    let app = AppDir::new().route_files(&["reports.rs"]);
    let registry = ModuleRegistry::new().with("reports.rs", || {
        Endpoints::new()
            .get("/export/", handler(empty))
            .get("/", handler(empty))
    });

    let config = app.config().resolve();
    let table = load_routes(&config, &registry).unwrap();
    let patterns: Vec<_> = table.routes().iter().map(|r| r.pattern()).collect();
    assert_eq!(patterns, ["/reports/export/", "/reports"]);

    assert!(table.find("GET", "/reports/export/").is_some());
    assert!(table.find("GET", "/reports/export").is_none());
}

#[test]
fn test_global_prefix() {
    let app = AppDir::new().route_files(&["index.rs", "items.rs"]);
    let registry = ModuleRegistry::new()
        .with("index.rs", || Endpoints::new().get("/", handler(empty)))
        .with("items.rs", || Endpoints::new().any("/:id", handler(empty)));

    assert_eq!(
        patterns(app.config().with_global_prefix("/api/"), &registry),
        ["GET /api", "ANY /api/items/:id"]
    );
}

#[test]
fn test_prefix_matching_index_collapses_to_root() {
    let app = AppDir::new().route_files(&["home.rs"]);
    let registry = ModuleRegistry::new().with("home.rs", || Endpoints::new().get("/", handler(empty)));

    assert_eq!(
        patterns(app.config().with_index("home"), &registry),
        ["GET /"]
    );
}

#[test]
fn test_priority_orders_files() {
    let app = AppDir::new().route_files(&["a.rs", "b.rs", "c.rs"]);
    let registry = ModuleRegistry::new()
        .with("a.rs", || Endpoints::new().get("/", handler(empty)))
        .with("b.rs", || Endpoints::new().priority(2).get("/", handler(empty)))
        .with("c.rs", || Endpoints::new().priority(1).get("/", handler(empty)));

    assert_eq!(
        patterns(app.config(), &registry),
        ["GET /c", "GET /b", "GET /a"]
    );
}

#[test]
fn test_exclude_regex_skips_files() {
    let app = AppDir::new().route_files(&["_helpers.rs", "public.rs"]);
    let registry = ModuleRegistry::new().with("public.rs", || Endpoints::new().get("/", handler(empty)));

    assert_eq!(
        patterns(app.config().with_exclude_regex("^_"), &registry),
        ["GET /public"]
    );
}

#[test]
fn test_default_export_wins_over_named() {
    let app = AppDir::new().route_files(&["legacy.mjs"]);
    let registry = ModuleRegistry::new().with("legacy.mjs", || ModuleExports {
        default: Some(Endpoints::new().put("/", handler(empty))),
        named: Endpoints::new().get("/", handler(empty)),
    });

    let table = load_routes(&app.config().resolve(), &registry).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.routes()[0].method, RouteMethod::Put);
}

#[test]
fn test_parameter_names_follow_pattern_order() {
    let app = AppDir::new().route_files(&["orgs.rs"]);
    let registry = ModuleRegistry::new()
        .with("orgs.rs", || Endpoints::new().get("/:org/repos/:repo", handler(empty)));

    let table = load_routes(&app.config().resolve(), &registry).unwrap();
    assert_eq!(table.routes()[0].parameter_names(), ["org", "repo"]);
    assert_eq!(table.routes()[0].source, "orgs.rs");
}
