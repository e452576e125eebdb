mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;

use verdantpack::common::ModuleError;
use verdantpack::loader::{
    is_stale_artifact_error, load_route_module, ReloadPolicy, RenderSupervisor, RenderVerdict,
};

#[tokio::test]
async fn resolving_importer_returns_value_unchanged() {
    let reloader = Arc::new(CountingReloader::default());
    let policy = ReloadPolicy::new(reloader.clone());

    let loaded = load_route_module(|| async { Ok::<_, ModuleError>(41 + 1) }, &policy).await;

    assert_eq!(loaded.unwrap(), 42);
    assert_eq!(reloader.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stale_marker_reloads_once_and_never_settles() {
    let messages = [
        "Failed to fetch dynamically imported module: /assets/StorePage-3f9c2d1a.js",
        "Loading chunk 42 failed",
        "Loading CSS chunk vendor failed",
        "ChunkLoadError: cannot load chunk",
    ];

    for message in messages {
        let reloader = Arc::new(CountingReloader::default());
        let policy = ReloadPolicy::new(reloader.clone());

        let load = load_route_module(
            || async { Err::<(), _>(ModuleError::Import(message.to_string())) },
            &policy,
        );
        let settled = tokio::time::timeout(Duration::from_secs(2), load).await;

        assert!(settled.is_err(), "load settled for {message:?}");
        assert_eq!(reloader.count(), 1, "reload count for {message:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn typed_missing_artifact_is_treated_as_stale() {
    let reloader = Arc::new(CountingReloader::default());
    let policy = ReloadPolicy::new(reloader.clone());

    let load = load_route_module(
        || async { Err::<(), _>(ModuleError::MissingArtifact("page.1a2b3c.html".into())) },
        &policy,
    );

    assert!(tokio::time::timeout(Duration::from_secs(2), load)
        .await
        .is_err());
    assert_eq!(reloader.count(), 1);
}

#[tokio::test]
async fn unrelated_failure_propagates_unchanged() {
    let reloader = Arc::new(CountingReloader::default());
    let policy = ReloadPolicy::new(reloader.clone());

    let loaded = load_route_module(
        || async { Err::<(), _>(ModuleError::Import("network error: 500".to_string())) },
        &policy,
    )
    .await;

    let err = loaded.unwrap_err();
    assert_eq!(err.to_string(), "network error: 500");
    assert_eq!(reloader.count(), 0);
}

#[test]
fn marker_match_is_case_insensitive() {
    assert!(is_stale_artifact_error(&ModuleError::Import(
        "CHUNKLOADERROR".into()
    )));
    assert!(is_stale_artifact_error(&ModuleError::Import(
        "loading CHUNK 7 failed".into()
    )));
    assert!(!is_stale_artifact_error(&ModuleError::Import(
        "database on fire".into()
    )));
}

#[tokio::test(start_paused = true)]
async fn classifier_is_swappable() {
    let reloader = Arc::new(CountingReloader::default());
    let policy = ReloadPolicy::with_classifier(reloader.clone(), |err| {
        matches!(err, ModuleError::Import(msg) if msg.as_str() == "artifact-gone")
    });

    // The default markers no longer classify as stale under this policy.
    let loaded = load_route_module(
        || async { Err::<(), _>(ModuleError::Import("Loading chunk 3 failed".into())) },
        &policy,
    )
    .await;
    assert!(loaded.is_err());
    assert_eq!(reloader.count(), 0);

    let load = load_route_module(
        || async { Err::<(), _>(ModuleError::Import("artifact-gone".into())) },
        &policy,
    );
    assert!(tokio::time::timeout(Duration::from_secs(2), load)
        .await
        .is_err());
    assert_eq!(reloader.count(), 1);
}

#[test]
fn supervisor_reloads_on_stale_signature() {
    let reloader = Arc::new(CountingReloader::default());
    let policy = Arc::new(ReloadPolicy::new(reloader.clone()));
    let supervisor = RenderSupervisor::new(policy);

    let verdict = supervisor.absorb(&ModuleError::MissingArtifact("page.9.html".into()));

    assert_eq!(verdict, RenderVerdict::Reload);
    assert_eq!(reloader.count(), 1);
}

#[test]
fn supervisor_falls_back_with_details_otherwise() {
    let reloader = Arc::new(CountingReloader::default());
    let policy = Arc::new(ReloadPolicy::new(reloader.clone()));
    let supervisor = RenderSupervisor::new(policy);

    let verdict = supervisor.absorb(&ModuleError::Import("template exploded".into()));

    match verdict {
        RenderVerdict::Fallback { message, details } => {
            assert!(!message.is_empty());
            assert_eq!(details, "template exploded");
        }
        RenderVerdict::Reload => panic!("stale verdict for a genuine failure"),
    }
    assert_eq!(reloader.count(), 0);
}
