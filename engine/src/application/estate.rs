// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Estate
//! The registry of applications and the entry point for every operation on
//! them. Deploys and removals of one app are serialized on that app's lock;
//! different apps never wait on each other.

use crate::domain::entities::app_record::STATUS_STOPPED;
use crate::domain::services::{
    DeployReport, DeploymentProtocol, ProgressReceiver, progress_channel,
};
use crate::domain::{
    AppDescription, AppName, AppRecord, AppRepository, DomainError, ProcessSupervisor, Result,
    SharedSink,
};
use crate::infrastructure::adapters::{Toolchain, standard_adapters};
use crate::infrastructure::{
    Config, GitSourceFetcher, HttpReachabilityProbe, InMemoryAppRepository, LocalPortAllocator,
    TokioProcessSupervisor,
};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub struct Estate {
    repository: Arc<dyn AppRepository>,
    protocol: Arc<DeploymentProtocol>,
}

impl Estate {
    pub fn new(repository: Arc<dyn AppRepository>, protocol: Arc<DeploymentProtocol>) -> Self {
        Self {
            repository,
            protocol,
        }
    }

    /// Wire the production implementations of every port
    pub fn from_config(config: &Config) -> Self {
        let supervisor: Arc<dyn ProcessSupervisor> =
            Arc::new(TokioProcessSupervisor::new(config.stop_grace()));
        let fetcher = Arc::new(GitSourceFetcher::new(
            supervisor.clone(),
            &config.toolchain.git,
            config.fetch_timeout(),
        ));
        let adapters = standard_adapters(
            Toolchain::new(supervisor.clone(), config.build_step_timeout()),
            &config.toolchain,
            config.gopath_root(),
        );
        let probe = Arc::new(HttpReachabilityProbe::new(Duration::from_millis(
            config.deploy.probe_timeout_ms,
        )));
        let protocol = DeploymentProtocol::new(
            fetcher,
            adapters,
            supervisor,
            probe,
            Arc::new(LocalPortAllocator),
            config.deploy_settings(),
        );
        Self::new(Arc::new(InMemoryAppRepository::new()), Arc::new(protocol))
    }

    async fn record(&self, name: &str) -> Result<Arc<AppRecord>> {
        self.repository
            .find(name)
            .await?
            .ok_or_else(|| DomainError::NotFound(name.to_string()))
    }

    /// Register a new app. Nothing is fetched or built until it is deployed.
    pub async fn register(&self, name: &str, source_url: &str) -> Result<AppDescription> {
        let name = AppName::parse(name)?;
        let source_url = validate_source_url(source_url)?;
        let record = Arc::new(AppRecord::new(
            name,
            source_url,
            self.protocol.settings().log_capacity,
        ));
        self.repository.insert(record.clone()).await?;
        Ok(record.describe())
    }

    /// Point an app at a new repository; the next deploy fetches from it
    pub async fn update(&self, name: &str, source_url: &str) -> Result<AppDescription> {
        let source_url = validate_source_url(source_url)?;
        let record = self.record(name).await?;
        let _deploys = record.lock_deploys().await;
        if record.is_removed() {
            return Err(DomainError::NotFound(name.to_string()));
        }
        record.set_source_url(source_url);
        info!(app = %name, source = %source_url, "Source URL updated");
        Ok(record.describe())
    }

    /// Stop the current instance, if any, and forget the app. The record
    /// stays findable until its instance is gone.
    pub async fn remove(&self, name: &str) -> Result<AppDescription> {
        let record = self.record(name).await?;
        let _deploys = record.lock_deploys().await;
        if record.is_removed() {
            return Err(DomainError::NotFound(name.to_string()));
        }

        if let Some(instance) = record.mark_removed() {
            self.protocol.retire(record.name(), instance).await;
        }
        self.repository.remove(name).await?;
        info!(app = %name, "App removed");
        Ok(record.describe())
    }

    pub async fn find(&self, name: &str) -> Result<AppDescription> {
        Ok(self.record(name).await?.describe())
    }

    /// Every registered app, ordered by name
    pub async fn all(&self) -> Result<Vec<AppDescription>> {
        let mut apps: Vec<AppDescription> = self
            .repository
            .all()
            .await?
            .iter()
            .map(|record| record.describe())
            .collect();
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apps)
    }

    pub async fn all_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .repository
            .all()
            .await?
            .iter()
            .map(|record| record.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Build and deploy the app's latest source without downtime.
    ///
    /// Progress lines go to `progress`, framed by a header line and a final
    /// `Success` or `Error while deploying: <cause>` line. A deploy of an app
    /// that is already deploying waits for the running one to finish.
    pub async fn deploy(&self, name: &str, progress: SharedSink) -> Result<DeployReport> {
        let record = self.record(name).await?;
        progress.line(&format!(
            "Going to build and deploy {name} at {}",
            now_rfc3339()
        ));

        let result = {
            let _deploys = record.lock_deploys().await;
            if record.is_removed() {
                Err(DomainError::NotFound(name.to_string()))
            } else {
                self.protocol.deploy(&record, progress.clone()).await
            }
        };

        match &result {
            Ok(report) => {
                info!(app = %name, instance = %report.instance.id, "Deploy succeeded");
                progress.line("Success");
            }
            Err(e) => progress.line(&format!("Error while deploying: {e}")),
        }
        result
    }

    /// Deploy in the background, returning the progress stream
    pub fn deploy_streaming(self: &Arc<Self>, name: &str) -> ProgressReceiver {
        let (sender, receiver) = progress_channel();
        let sender = Arc::new(sender);
        let estate = self.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            let result = estate.deploy(&name, sender.clone()).await;
            sender.finish(result.map(|_| ()).map_err(|e| e.to_string()));
        });
        receiver
    }

    /// Tear down the current instance but keep the app registered.
    ///
    /// Does not wait for an in-flight deploy; if that deploy later promotes
    /// a candidate, another stop takes it down.
    pub async fn stop(&self, name: &str) -> Result<AppDescription> {
        let record = self.record(name).await?;
        match record.take_current(STATUS_STOPPED) {
            Some(instance) => self.protocol.retire(record.name(), instance).await,
            None => debug!(app = %name, "Stop requested, no instance running"),
        }
        Ok(record.describe())
    }

    /// Stop every running instance; used when the host shuts down
    pub async fn shutdown(&self) {
        let records = self.repository.all().await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not list apps for shutdown");
            Vec::new()
        });

        let mut stops = JoinSet::new();
        for record in records {
            if let Some(instance) = record.take_current(STATUS_STOPPED) {
                let protocol = self.protocol.clone();
                stops.spawn(async move { protocol.retire(record.name(), instance).await });
            }
        }
        let stopped = stops.len();
        while stops.join_next().await.is_some() {}
        self.protocol.wait_for_teardowns().await;
        info!(stopped = stopped, "All app instances stopped");
    }
}

fn validate_source_url(source_url: &str) -> Result<&str> {
    let trimmed = source_url.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidSourceUrl(
            "source URL must not be blank".to_string(),
        ));
    }
    Ok(trimmed)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "an unknown time".to_string())
}
