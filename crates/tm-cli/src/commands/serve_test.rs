use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use std::sync::Arc;
use tm_core::{BundleProvider, MemoryBundle};
use tm_db::DuckDbBackend;
use tm_migrate::MigrationOptions;
use tower::ServiceExt;

fn state(scripts: &[(&str, &str)]) -> Arc<AppState> {
    let mut bundle = MemoryBundle::new();
    for (file, sql) in scripts {
        bundle.insert(format!("migrations/{file}"), *sql);
    }
    let options = MigrationOptions::new("migration_history")
        .with_provider(BundleProvider::new("migrations", bundle).unwrap());
    let migrator =
        Migrator::new(Arc::new(DuckDbBackend::in_memory().unwrap()), options).unwrap();
    Arc::new(AppState {
        migrator,
        gate: RunOnceGate::new(Duration::from_secs(120)),
    })
}

async fn post(app: Router) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/migrate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let app = router(state(&[]));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_trigger_applies_then_skips() {
    let state = state(&[
        ("1_Init.sql", "CREATE TABLE people (id BIGINT);"),
        ("2_AddPets.sql", "CREATE TABLE pets (id BIGINT);"),
    ]);

    let (status, body) = post(router(state.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "applied");
    assert_eq!(body["applied"].as_array().unwrap().len(), 2);
    assert_eq!(body["applied"][0]["name"], "Init");
    assert_eq!(body["last_applied"], 2);

    let (status, body) = post(router(state)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "skipped");
    assert!(body["applied"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_trigger_failure_returns_500() {
    let state = state(&[("1_Broken.sql", "CREATE TABLE (")]);

    let (status, body) = post(router(state.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("M003"));

    // the failed attempt still closes the gate
    let (status, body) = post(router(state)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "skipped");
}

#[tokio::test]
async fn test_get_migrate_not_allowed() {
    let app = router(state(&[]));
    let response = app
        .oneshot(Request::builder().uri("/migrate").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
