//! E2E tests for deploys driven through the estate

#![cfg(unix)]

mod common;

use apprunner_engine::DomainError;
use apprunner_engine::domain::Availability;
use common::*;
use std::time::Duration;

#[tokio::test]
async fn test_first_deploy_makes_app_available() {
    let harness = Harness::new();
    let project = Project::new(OK_BUILD, Some(READY_APP));
    harness.estate.register("demo", &project.url()).await.unwrap();

    let progress = progress();
    let report = harness.estate.deploy("demo", progress.clone()).await.unwrap();
    assert!(report.replaced.is_none());
    assert!(pid_alive(report.instance.pid));

    let desc = harness.estate.find("demo").await.unwrap();
    assert_eq!(desc.availability, Availability::Available);
    assert_eq!(desc.instance.as_ref().unwrap().id, report.instance.id);
    assert!(desc.build_log.contains("[/bin/sh build.sh] building"));
    assert!(
        desc.console_log
            .contains(&format!("serving demo on {}", report.instance.port)),
        "App should see its name and port: {}",
        desc.console_log
    );
    assert_eq!(desc.contributors, vec!["Tester".to_string()]);

    let lines = progress.lines();
    assert!(lines.first().unwrap().starts_with("Going to build and deploy demo at "));
    assert_eq!(lines.last().unwrap(), "Success");

    harness.estate.shutdown().await;
    assert!(!pid_alive(report.instance.pid));
}

#[tokio::test]
async fn test_redeploy_swaps_without_downtime() {
    let harness = Harness::new();
    let project = Project::new(OK_BUILD, Some(READY_APP));
    harness.estate.register("demo", &project.url()).await.unwrap();
    let first = harness.estate.deploy("demo", progress()).await.unwrap();

    // Watch availability for the whole second deploy
    let estate = harness.estate.clone();
    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        for _ in 0..200 {
            seen.push(estate.find("demo").await.unwrap().availability);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        seen
    });

    let second = harness.estate.deploy("demo", progress()).await.unwrap();
    let seen = watcher.await.unwrap();
    assert!(
        seen.iter().all(|a| *a == Availability::Available),
        "App should stay available during a redeploy: {seen:?}"
    );

    assert_eq!(second.replaced, Some(first.instance.id));
    assert_ne!(second.instance.pid, first.instance.pid);
    assert_ne!(second.instance.port, first.instance.port);
    assert!(!pid_alive(first.instance.pid), "Old instance should be stopped");
    assert!(!first.instance.dir.exists(), "Old instance dir should be removed");
    assert!(pid_alive(second.instance.pid));

    harness.estate.shutdown().await;
}

#[tokio::test]
async fn test_unresponsive_candidate_is_rolled_back() {
    let harness = Harness::new();
    let project = Project::new(OK_BUILD, Some(READY_APP));
    harness.estate.register("demo", &project.url()).await.unwrap();
    let first = harness.estate.deploy("demo", progress()).await.unwrap();

    project.write(OK_BUILD, Some(SILENT_APP));
    let progress = progress();
    let err = harness
        .estate
        .deploy("demo", progress.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::HealthCheckTimeout { .. }), "{err:?}");
    assert!(progress.lines().last().unwrap().starts_with("Error while deploying: "));

    // The old instance keeps serving, the candidate is gone
    let desc = harness.estate.find("demo").await.unwrap();
    assert_eq!(desc.availability, Availability::Available);
    assert_eq!(desc.instance.unwrap().id, first.instance.id);
    assert!(pid_alive(first.instance.pid));

    let candidate: u32 = harness.read_marker("silent-pid").trim().parse().unwrap();
    assert!(!pid_alive(candidate), "Candidate should be stopped");

    harness.estate.shutdown().await;
}

#[tokio::test]
async fn test_build_failure_keeps_current_instance() {
    let harness = Harness::new();
    let project = Project::new(OK_BUILD, Some(READY_APP));
    harness.estate.register("demo", &project.url()).await.unwrap();
    let first = harness.estate.deploy("demo", progress()).await.unwrap();

    project.write(FAILING_BUILD, Some(READY_APP));
    let err = harness.estate.deploy("demo", progress()).await.unwrap_err();
    assert!(matches!(err, DomainError::BuildFailure { .. }), "{err:?}");

    let desc = harness.estate.find("demo").await.unwrap();
    assert_eq!(desc.availability, Availability::Available);
    assert!(desc.build_log.contains("broken"), "{}", desc.build_log);
    assert!(pid_alive(first.instance.pid));

    // The failed attempt's directory is cleaned up
    let instances = harness.data.path().join("instances").join("demo");
    let left: Vec<_> = std::fs::read_dir(&instances)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(left, vec![first.instance.dir.clone()]);

    harness.estate.shutdown().await;
}

#[tokio::test]
async fn test_unsupported_project_is_rejected() {
    let harness = Harness::new();
    let project = Project::new(OK_BUILD, None);
    harness.estate.register("demo", &project.url()).await.unwrap();

    let err = harness.estate.deploy("demo", progress()).await.unwrap_err();
    assert!(matches!(err, DomainError::UnsupportedProjectType(_)), "{err:?}");

    let desc = harness.estate.find("demo").await.unwrap();
    assert_eq!(desc.availability, Availability::Unavailable);
    assert!(desc.instance.is_none());
}

#[tokio::test]
async fn test_exiting_candidate_is_start_failure() {
    let harness = Harness::new();
    let project = Project::new(OK_BUILD, Some(CRASHING_APP));
    harness.estate.register("demo", &project.url()).await.unwrap();

    let err = harness.estate.deploy("demo", progress()).await.unwrap_err();
    match err {
        DomainError::StartFailure { cause, .. } => {
            assert!(cause.contains("exit code 3"), "{cause}")
        }
        other => panic!("Expected StartFailure, got {other:?}"),
    }
    let desc = harness.estate.find("demo").await.unwrap();
    assert_eq!(desc.availability, Availability::Unavailable);
    assert!(desc.console_log.contains("boom"));
}

#[tokio::test]
async fn test_deploys_of_one_app_are_serialized() {
    let harness = Harness::new();
    let build = "echo start >> \"$MARKER_DIR/builds\"\nsleep 0.3\necho end >> \"$MARKER_DIR/builds\"\n";
    let project = Project::new(build, Some(READY_APP));
    harness.estate.register("demo", &project.url()).await.unwrap();

    let (a, b) = tokio::join!(
        harness.estate.deploy("demo", progress()),
        harness.estate.deploy("demo", progress())
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(harness.read_marker("builds"), "start\nend\nstart\nend\n");
    // One of them replaced the other
    assert!(b.replaced == Some(a.instance.id) || a.replaced == Some(b.instance.id));

    harness.estate.shutdown().await;
}

#[tokio::test]
async fn test_deploys_of_different_apps_overlap() {
    let harness = Harness::new();
    let build = "echo start >> \"$MARKER_DIR/builds\"\nsleep 1\necho end >> \"$MARKER_DIR/builds\"\n";
    let project = Project::new(build, Some(READY_APP));
    harness.estate.register("one", &project.url()).await.unwrap();
    harness.estate.register("two", &project.url()).await.unwrap();

    let (a, b) = tokio::join!(
        harness.estate.deploy("one", progress()),
        harness.estate.deploy("two", progress())
    );
    a.unwrap();
    b.unwrap();

    let builds = harness.read_marker("builds");
    let lines: Vec<&str> = builds.lines().collect();
    assert_eq!(lines[..2], ["start", "start"], "Builds should overlap: {lines:?}");

    harness.estate.shutdown().await;
}

#[tokio::test]
async fn test_deploy_unknown_app_is_not_found() {
    let harness = Harness::new();
    let err = harness.estate.deploy("ghost", progress()).await.unwrap_err();
    assert_eq!(err, DomainError::NotFound("ghost".into()));
}
