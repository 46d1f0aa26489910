//! End-to-end bootstrap scenarios against a mock Consul server.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use service_bootstrap::config::{
    APP_DEBUG, APP_ENV, APP_REMOTE, Bootstrapper, ConfigError, ConsulBackend, Environment,
    LOG_LEVEL_KEY, MapEnv, ProcessEnv, RemoteBackend, resolve_endpoint,
};
use std::fs;
use tempfile::TempDir;

const KV_PATH: &str = "/v1/kv/service/foo/config.json";

/// A port nothing listens on.
const DEAD_ENDPOINT: &str = "127.0.0.1:1";

fn local_dir(content: Option<&str>) -> TempDir {
    let dir = TempDir::new().unwrap();
    if let Some(content) = content {
        fs::write(dir.path().join("foo.config.json"), content).unwrap();
    }
    dir
}

async fn consul_with_document(body: serde_json::Value) -> ServerGuard {
    let mut server = Server::new_async().await;
    server
        .mock("GET", KV_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;
    server
}

fn run_env(app_env: &str, remote: &str) -> MapEnv {
    MapEnv::new().with(APP_ENV, app_env).with(APP_REMOTE, remote)
}

#[tokio::test]
async fn test_development_without_any_source_fails() {
    let dir = local_dir(None);

    let err = Bootstrapper::new()
        .with_env(run_env("development", DEAD_ENDPOINT))
        .with_search_dir(dir.path())
        .run("foo")
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::NoConfiguration(_)));
    assert_eq!(
        err.to_string(),
        "no valid configuration available for foo service"
    );
}

#[tokio::test]
async fn test_development_local_only_succeeds() {
    let dir = local_dir(Some(r#"{"port": 8080, "name": "foo"}"#));

    let settings = Bootstrapper::new()
        .with_env(run_env("development", DEAD_ENDPOINT))
        .with_search_dir(dir.path())
        .run("foo")
        .await
        .unwrap();

    assert_eq!(settings.environment(), Environment::Development);
    assert_eq!(settings.get_i64("port"), Some(8080));
    assert_eq!(settings.get_i64(LOG_LEVEL_KEY), Some(5));
}

#[tokio::test]
async fn test_production_remote_failure_is_fatal() {
    let dir = local_dir(Some(r#"{"port": 8080}"#));

    let err = Bootstrapper::new()
        .with_env(run_env("production", DEAD_ENDPOINT))
        .with_search_dir(dir.path())
        .run("foo")
        .await
        .unwrap_err();

    match err {
        ConfigError::RemoteLoad { endpoint, path, .. } => {
            assert_eq!(endpoint, DEAD_ENDPOINT);
            assert_eq!(path, "/service/foo/config.json");
        }
        other => panic!("expected remote error, got {other}"),
    }
}

#[tokio::test]
async fn test_staging_remote_only_succeeds() {
    let server = consul_with_document(json!({"feature": {"enabled": true}})).await;
    let dir = local_dir(None);

    let settings = Bootstrapper::new()
        .with_env(run_env("staging", &server.host_with_port()))
        .with_search_dir(dir.path())
        .run("foo")
        .await
        .unwrap();

    assert_eq!(settings.environment(), Environment::Staging);
    assert_eq!(settings.get_bool("feature.enabled"), Some(true));
    assert_eq!(settings.get_i64(LOG_LEVEL_KEY), Some(4));
}

#[tokio::test]
async fn test_remote_overlays_local_over_http() {
    let server = consul_with_document(json!({"port": 9000, "region": "eu"})).await;
    let dir = local_dir(Some(r#"{"port": 8080, "name": "foo"}"#));

    let settings = Bootstrapper::new()
        .with_env(run_env("uat", &server.url()))
        .with_search_dir(dir.path())
        .run("foo")
        .await
        .unwrap();

    assert_eq!(settings.get_i64("port"), Some(9000));
    assert_eq!(settings.get_str("name"), Some("foo"));
    assert_eq!(settings.get_str("region"), Some("eu"));
}

#[tokio::test]
async fn test_consul_missing_key_is_remote_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", KV_PATH)
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let backend = ConsulBackend::new(server.url()).unwrap();
    let err = backend.fetch("/service/foo/config.json").await.unwrap_err();
    assert!(err.to_string().contains("not found"));

    let dir = local_dir(Some(r#"{"port": 8080}"#));
    let err = Bootstrapper::new()
        .with_env(MapEnv::new().with(APP_ENV, "staging"))
        .with_search_dir(dir.path())
        .with_backend(backend)
        .run("foo")
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::RemoteLoad { .. }));
}

#[tokio::test]
async fn test_consul_server_error_is_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", KV_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let backend = ConsulBackend::new(server.url()).unwrap();
    let err = backend.fetch("/service/foo/config.json").await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_run_without_remote_var_targets_default_consul() {
    let dir = local_dir(Some(r#"{"port": 8080}"#));

    let err = Bootstrapper::new()
        .with_env(MapEnv::new().with(APP_ENV, "production"))
        .with_search_dir(dir.path())
        .run("foo")
        .await
        .unwrap_err();

    match err {
        ConfigError::RemoteLoad { endpoint, path, .. } => {
            assert_eq!(endpoint, "consul:8500");
            assert_eq!(path, "/service/foo/config.json");
        }
        other => panic!("expected remote error, got {other}"),
    }
}

#[test]
fn test_endpoint_defaults_to_consul() {
    temp_env::with_var_unset(APP_REMOTE, || {
        assert_eq!(resolve_endpoint(&ProcessEnv), "consul:8500");
    });
    temp_env::with_var(APP_REMOTE, Some(""), || {
        assert_eq!(resolve_endpoint(&ProcessEnv), "consul:8500");
    });
}

#[test]
fn test_process_env_is_normalized() {
    let server = {
        let mut server = Server::new();
        server
            .mock("GET", KV_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"name": "remote"}"#)
            .create();
        server
    };
    let dir = local_dir(None);
    let remote = server.host_with_port();

    temp_env::with_vars(
        [
            (APP_ENV, Some("nonsense")),
            (APP_REMOTE, Some(remote.as_str())),
            (APP_DEBUG, None),
        ],
        || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let settings = runtime
                .block_on(
                    Bootstrapper::new()
                        .with_search_dir(dir.path())
                        .run("foo"),
                )
                .unwrap();

            assert_eq!(settings.environment(), Environment::Production);
            assert_eq!(std::env::var(APP_ENV).unwrap(), "production");
            assert_eq!(settings.get_str("name"), Some("remote"));
            assert_eq!(settings.get_i64(LOG_LEVEL_KEY), Some(2));
        },
    );
}
