// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! apprunnerd
//! Registers the apps listed in the configuration, deploys them and keeps
//! them supervised until SIGINT or SIGTERM.

mod config;

use anyhow::Context;
use apprunner_engine::Estate;
use apprunner_engine::constants::deploy::SHUTDOWN_DRAIN_TIMEOUT_SEC;
use apprunner_engine::domain::{OutputSink, SharedSink};
use apprunner_engine::infrastructure::Config;
use config::DaemonConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Forwards deploy output to the daemon log
struct LogLines {
    app: String,
}

impl OutputSink for LogLines {
    fn line(&self, line: &str) {
        debug!(app = %self.app, "{}", line);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let daemon = DaemonConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&daemon.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = match &daemon.config_file {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(data_dir) = &daemon.data_dir {
        config.data_dir = data_dir.clone();
    }
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;

    info!(
        data_dir = %config.data_dir.display(),
        apps = config.apps.len(),
        "Starting apprunnerd"
    );

    let estate = Arc::new(Estate::from_config(&config));
    let mut deploys = JoinSet::new();
    for app in &config.apps {
        let name = app.app_name()?;
        estate.register(name.as_str(), &app.source_url).await?;
        if !app.deploy_on_start {
            continue;
        }

        let estate = estate.clone();
        deploys.spawn(async move {
            let progress: SharedSink = Arc::new(LogLines {
                app: name.to_string(),
            });
            match estate.deploy(name.as_str(), progress).await {
                Ok(report) => match serde_json::to_string(&report) {
                    Ok(json) => info!(app = %name, report = %json, "App deployed"),
                    Err(_) => info!(app = %name, "App deployed"),
                },
                Err(e) => error!(app = %name, kind = e.kind(), error = %e, "Deploy failed"),
            }
        });
    }

    shutdown_signal().await;
    info!("Shutdown signal received");

    drain_deploys(&mut deploys).await;
    estate.shutdown().await;
    if let Ok(apps) = estate.all().await
        && let Ok(json) = serde_json::to_string(&apps)
    {
        debug!(apps = %json, "Final app states");
    }
    info!("apprunnerd stopped");
    Ok(())
}

/// Let in-flight deploys finish; past the deadline they are abandoned,
/// which tears their candidates down
async fn drain_deploys(deploys: &mut JoinSet<()>) {
    if deploys.is_empty() {
        return;
    }
    info!(in_flight = deploys.len(), "Waiting for in-flight deploys");
    let limit = Duration::from_secs(SHUTDOWN_DRAIN_TIMEOUT_SEC);
    let drained = tokio::time::timeout(limit, async {
        while deploys.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(
            remaining = deploys.len(),
            timeout_secs = limit.as_secs(),
            "In-flight deploys did not finish, abandoning them"
        );
        deploys.abort_all();
        while deploys.join_next().await.is_some() {}
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
