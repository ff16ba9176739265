// ABOUTME: Integration tests for container runtime operations.
// ABOUTME: Tests run against the local Docker/Podman daemon and skip when none is found.

use shopstack::runtime::{
    BollardRuntime, ContainerError, ContainerOps, ExecConfig, ExecError, ExecOps, LogOps,
    RuntimeConfig, StackError, StackFile, StackOps, connect_local,
};
use shopstack::types::ContainerId;
use std::time::Duration;

/// Get local runtime, skipping test if unavailable.
async fn local_runtime() -> Option<BollardRuntime> {
    connect_local(&RuntimeConfig::default()).await.ok()
}

/// Skip test if no local runtime available.
macro_rules! require_runtime {
    () => {
        match local_runtime().await {
            Some(rt) => rt,
            None => {
                eprintln!("Skipping test: no local container runtime found");
                return;
            }
        }
    };
}

const MISSING: &str = "shopstack_test_container_that_does_not_exist";

#[tokio::test]
async fn runtime_ping() {
    let runtime = require_runtime!();
    runtime.ping().await.expect("ping should succeed");
}

#[tokio::test]
async fn published_ports_lists_without_error() {
    let runtime = require_runtime!();
    runtime
        .published_ports()
        .await
        .expect("listing published ports should succeed");
}

#[tokio::test]
async fn inspect_missing_container_is_not_found() {
    let runtime = require_runtime!();
    let err = runtime
        .inspect_container(&ContainerId::new(MISSING))
        .await
        .unwrap_err();
    assert!(matches!(err, ContainerError::NotFound(_)), "got {err:?}");
    assert!(err.is_absent());
}

#[tokio::test]
async fn stop_and_remove_missing_container_are_absent() {
    let runtime = require_runtime!();
    let id = ContainerId::new(MISSING);

    let stop = runtime
        .stop_container(&id, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(stop.is_absent(), "got {stop:?}");

    let remove = runtime.remove_container(&id, true).await.unwrap_err();
    assert!(remove.is_absent(), "got {remove:?}");
}

#[tokio::test]
async fn exec_in_missing_container_fails() {
    let runtime = require_runtime!();
    let config = ExecConfig::capture(vec!["true".into()], Duration::from_secs(5));
    let err = runtime
        .exec(&ContainerId::new(MISSING), &config)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ExecError::ContainerNotFound(_) | ExecError::ContainerNotRunning(_)
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn logs_of_missing_container_fail() {
    let runtime = require_runtime!();
    assert!(
        runtime
            .recent_logs(&ContainerId::new(MISSING), 10)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn stack_up_without_definition_fails() {
    let runtime = require_runtime!();
    let tmp = tempfile::tempdir().unwrap();
    let stack = StackFile::new("shopstacktestmissing", tmp.path());

    let err = runtime
        .stack_up(&stack, Duration::from_secs(30))
        .await
        .unwrap_err();
    assert!(
        matches!(err, StackError::Failed { .. } | StackError::Spawn(_)),
        "got {err:?}"
    );
}
