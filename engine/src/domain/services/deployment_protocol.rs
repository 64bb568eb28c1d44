// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Deployment protocol
//! Drives one deploy attempt of an app through
//! `Idle → Fetching → Building → Starting → HealthChecking → {Promoted | RolledBack}`.
//!
//! The candidate is built and started next to the instance currently
//! serving; the swap happens only once the candidate answers requests, and
//! the previous instance is stopped after the swap. Any failure before that
//! point discards the candidate and leaves the current instance untouched.

use crate::constants::app_env;
use crate::domain::services::instance_dirs::{
    app_data_dir, checkout_dir, instance_dir, prepare_instance, project_dir,
    remove_instance_dir, temp_dir,
};
use crate::domain::entities::PriorState;
use crate::domain::services::{
    AdapterSelector, DetachableSink, LogBuffer, TeeSink, readiness_pair,
};
use crate::domain::{
    AppName, AppRecord, BuildContext, BuildRunAdapter, DeployState, DomainError, ExitOutcome,
    Instance, InstanceId, InstanceInfo, PortAllocator, ProcessHandle, ProcessSupervisor,
    ReachabilityProbe, Result, SharedSink, SourceFetcher,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Tunables of the protocol
#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Root of checkouts, instance directories and app data
    pub data_dir: PathBuf,
    pub health_check_interval: Duration,
    /// Overall deadline for a candidate to become reachable
    pub health_check_timeout: Duration,
    /// Upper bound of a single reachability probe
    pub probe_timeout: Duration,
    /// Caller-supplied variables for every app process
    pub env: BTreeMap<String, String>,
    /// Lines kept per build/console log
    pub log_capacity: usize,
}

/// Result of a promoted deploy
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub app: String,
    pub instance: InstanceInfo,
    /// Instance that served before this deploy, now stopped
    pub replaced: Option<InstanceId>,
}

/// `http://127.0.0.1:<port>/<app>/`
pub fn health_url(app: &AppName, port: u16) -> String {
    format!("http://127.0.0.1:{port}/{app}/")
}

pub struct DeploymentProtocol {
    fetcher: Arc<dyn SourceFetcher>,
    adapters: AdapterSelector,
    supervisor: Arc<dyn ProcessSupervisor>,
    probe: Arc<dyn ReachabilityProbe>,
    ports: Arc<dyn PortAllocator>,
    settings: DeploySettings,
    /// Stops and directory removals that must outlive the deploy that
    /// started them
    teardowns: TaskTracker,
}

impl DeploymentProtocol {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        adapters: AdapterSelector,
        supervisor: Arc<dyn ProcessSupervisor>,
        probe: Arc<dyn ReachabilityProbe>,
        ports: Arc<dyn PortAllocator>,
        settings: DeploySettings,
    ) -> Self {
        Self {
            fetcher,
            adapters,
            supervisor,
            probe,
            ports,
            settings,
            teardowns: TaskTracker::new(),
        }
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    /// Run one deploy attempt to a terminal state.
    ///
    /// The caller must hold the record's deploy lock. Build and console
    /// output is forwarded to `progress` until this returns. If the returned
    /// future is dropped early, the candidate is torn down in the background
    /// and the record is rolled back.
    pub async fn deploy(
        &self,
        record: &Arc<AppRecord>,
        progress: SharedSink,
    ) -> Result<DeployReport> {
        let progress = Arc::new(DetachableSink::new(progress));
        let _detach = DetachOnDrop(progress.clone());

        let logs = DeployLogs {
            build: Arc::new(LogBuffer::new(self.settings.log_capacity)),
            console: Arc::new(LogBuffer::new(self.settings.log_capacity)),
            progress,
        };
        let mut pending = PendingDeploy {
            record: record.as_ref(),
            prior: Some(record.begin_deploy(
                "Fetching source",
                logs.build.clone(),
                logs.console.clone(),
            )),
        };

        let mut run = DeployRun::new(record.name());
        run.advance(DeployState::Fetching);

        match self.attempt(record, &mut run, &logs).await {
            Ok(candidate) => {
                pending.settle();
                run.advance(DeployState::Promoted);
                Ok(self.promote(record, candidate).await)
            }
            Err(err) => {
                let err = logs.attach(err);
                run.advance(DeployState::RolledBack);
                if let Some(prior) = pending.settle() {
                    record.roll_back(prior, &err);
                }
                warn!(
                    app = %record.name(),
                    kind = err.kind(),
                    error = %err,
                    "Deploy rolled back"
                );
                Err(err)
            }
        }
    }

    /// Stop an instance that is no longer current and delete its directory
    pub async fn retire(&self, app: &AppName, instance: Instance) {
        info!(
            app = %app,
            instance = %instance.id(),
            pid = instance.handle().pid(),
            "Stopping instance"
        );
        let supervisor = self.supervisor.clone();
        let app = app.clone();
        let teardown = self.teardowns.spawn(async move {
            if let Err(e) = supervisor.stop(instance.handle()).await {
                warn!(app = %app, instance = %instance.id(), error = %e, "Failed to stop instance");
            }
            remove_dir(instance.dir().clone()).await;
        });
        if let Err(e) = teardown.await {
            warn!(error = %e, "Instance teardown task failed");
        }
    }

    /// Wait until every stop started by this protocol, including those of
    /// abandoned deploys, has finished
    pub async fn wait_for_teardowns(&self) {
        self.teardowns.close();
        self.teardowns.wait().await;
        self.teardowns.reopen();
    }

    async fn attempt(
        &self,
        record: &AppRecord,
        run: &mut DeployRun<'_>,
        logs: &DeployLogs,
    ) -> Result<Instance> {
        let name = record.name();
        let data_dir = &self.settings.data_dir;
        let checkout = checkout_dir(data_dir, name.as_str());
        let source_url = record.source_url();

        info!(app = %name, source = %source_url, "Fetching source");
        self.fetcher
            .fetch_or_update(&source_url, &checkout, logs.build_sink())
            .await?;
        record.set_working_dir(checkout.clone());
        match self.fetcher.contributors(&checkout).await {
            Ok(contributors) => record.set_contributors(contributors),
            Err(e) => debug!(app = %name, error = %e, "Could not list contributors"),
        }

        run.advance(DeployState::Building);
        record.set_status("Building");
        let adapter = self.adapters.select(&checkout)?;

        let dir = instance_dir(data_dir, name.as_str(), &InstanceId::generate().short());
        let app_data = app_data_dir(data_dir, name.as_str());
        let mut candidate = CandidateGuard {
            app: name.clone(),
            dir: dir.clone(),
            process: None,
            teardowns: Some(self.teardowns.clone()),
        };
        let prepared = {
            let (checkout, dir, app_data) = (checkout.clone(), dir.clone(), app_data.clone());
            tokio::task::spawn_blocking(move || prepare_instance(&checkout, &dir, &app_data))
                .await
                .map_err(|e| {
                    DomainError::SupervisorFault(format!("Instance preparation failed: {e}"))
                })
                .and_then(|prepared| prepared)
        };

        let result = match prepared {
            Ok(()) => {
                self.build_and_launch(record, run, adapter, &dir, &app_data, logs, &mut candidate)
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(instance) => {
                candidate.disarm();
                Ok(instance)
            }
            Err(e) => {
                candidate.discard().await;
                Err(e)
            }
        }
    }

    async fn build_and_launch(
        &self,
        record: &AppRecord,
        run: &mut DeployRun<'_>,
        adapter: Arc<dyn BuildRunAdapter>,
        dir: &Path,
        app_data: &Path,
        logs: &DeployLogs,
        candidate: &mut CandidateGuard,
    ) -> Result<Instance> {
        let name = record.name();
        let mut ctx = BuildContext {
            app_name: name.clone(),
            project_dir: project_dir(dir),
            env: self.app_env(name, dir, app_data),
        };

        info!(
            app = %name,
            adapter = %adapter.kind(),
            dir = %ctx.project_dir.display(),
            "Building candidate"
        );
        adapter.build(&ctx, logs.build_sink()).await?;

        run.advance(DeployState::Starting);
        record.set_status("Starting");
        let port = self.ports.allocate()?;
        ctx.env
            .insert(app_env::APP_PORT.to_string(), port.to_string());

        let (waiter, signal) = readiness_pair();
        let handle = adapter.run(&ctx, logs.console_sink(), waiter).await?;
        candidate.process = Some((adapter.clone(), handle.clone()));
        if signal.issued().await.is_none() {
            return Err(DomainError::start_failure(
                "adapter returned without reporting the launch",
            ));
        }
        info!(
            app = %name,
            pid = handle.pid(),
            port = port,
            "Candidate launched, waiting for it to answer"
        );

        run.advance(DeployState::HealthChecking);
        record.set_status("Health checking");
        self.await_reachable(name, port, &handle).await?;

        Ok(Instance::new(handle, adapter.kind(), port, dir.to_path_buf()))
    }

    /// Poll the candidate until it answers, exits, or the deadline passes
    async fn await_reachable(
        &self,
        name: &AppName,
        port: u16,
        handle: &ProcessHandle,
    ) -> Result<()> {
        let url = health_url(name, port);
        let deadline = Instant::now() + self.settings.health_check_timeout;
        let mut attempts = 0u32;

        loop {
            if let Some(outcome) = handle.exit_outcome() {
                return Err(exited_early(outcome));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DomainError::HealthCheckTimeout {
                    timeout_secs: self.settings.health_check_timeout.as_secs(),
                    console_log: String::new(),
                });
            }

            attempts += 1;
            let budget = self.settings.probe_timeout.min(remaining);
            let reachable = tokio::time::timeout(budget, self.probe.is_reachable(&url))
                .await
                .unwrap_or(false);
            if reachable {
                debug!(app = %name, url = %url, attempts = attempts, "Candidate is reachable");
                return Ok(());
            }

            let pause = self
                .settings
                .health_check_interval
                .min(deadline.saturating_duration_since(Instant::now()));
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                outcome = handle.wait() => return Err(exited_early(outcome)),
            }
        }
    }

    async fn promote(&self, record: &Arc<AppRecord>, candidate: Instance) -> DeployReport {
        let info = candidate.info();
        let handle = candidate.handle().clone();
        let previous = record.promote(candidate);
        info!(
            app = %record.name(),
            instance = %info.id,
            pid = info.pid,
            port = info.port,
            "Promoted candidate instance"
        );

        tokio::spawn(watch_for_exit(record.clone(), handle));

        let replaced = match previous {
            Some(previous) => {
                let id = previous.id();
                self.retire(record.name(), previous).await;
                Some(id)
            }
            None => None,
        };

        DeployReport {
            app: record.name().to_string(),
            instance: info,
            replaced,
        }
    }

    /// Variables for every process of an app instance. Caller-supplied
    /// values override the defaults, except `APP_NAME` and `APP_PORT`.
    pub fn app_env(
        &self,
        name: &AppName,
        instance_dir: &Path,
        app_data: &Path,
    ) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            app_env::APP_DATA.to_string(),
            app_data.display().to_string(),
        );
        env.insert(
            app_env::TEMP.to_string(),
            temp_dir(instance_dir).display().to_string(),
        );
        env.extend(self.settings.env.clone());
        env.insert(app_env::APP_NAME.to_string(), name.to_string());
        env
    }
}

fn exited_early(outcome: ExitOutcome) -> DomainError {
    DomainError::start_failure(format!(
        "process exited before answering requests ({outcome})"
    ))
}

async fn remove_dir(dir: PathBuf) {
    let shown = dir.display().to_string();
    if let Err(e) = tokio::task::spawn_blocking(move || remove_instance_dir(&dir)).await {
        warn!(dir = %shown, error = %e, "Instance directory removal failed");
    }
}

type LaunchedCandidate = (Arc<dyn BuildRunAdapter>, ProcessHandle);

async fn tear_down_candidate(app: AppName, dir: PathBuf, process: Option<LaunchedCandidate>) {
    if let Some((adapter, handle)) = process {
        debug!(app = %app, pid = handle.pid(), "Discarding candidate");
        if let Err(e) = adapter.stop(&handle).await {
            warn!(app = %app, pid = handle.pid(), error = %e, "Failed to stop candidate");
        }
    }
    remove_dir(dir).await;
}

/// Owns a candidate until it is promoted. Dropping it armed stops the
/// candidate process and removes its directory in the background.
struct CandidateGuard {
    app: AppName,
    dir: PathBuf,
    process: Option<LaunchedCandidate>,
    /// `None` once disarmed
    teardowns: Option<TaskTracker>,
}

impl CandidateGuard {
    fn disarm(&mut self) {
        self.teardowns = None;
    }

    /// Tear the candidate down and wait for it
    async fn discard(&mut self) {
        let Some(teardowns) = self.teardowns.take() else {
            return;
        };
        let teardown = teardowns.spawn(tear_down_candidate(
            self.app.clone(),
            std::mem::take(&mut self.dir),
            self.process.take(),
        ));
        if let Err(e) = teardown.await {
            warn!(app = %self.app, error = %e, "Candidate teardown task failed");
        }
    }
}

impl Drop for CandidateGuard {
    fn drop(&mut self) {
        let Some(teardowns) = self.teardowns.take() else {
            return;
        };
        let (app, dir, process) = (
            self.app.clone(),
            std::mem::take(&mut self.dir),
            self.process.take(),
        );
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(app = %app, "Deploy abandoned, tearing down its candidate");
                teardowns.spawn_on(tear_down_candidate(app, dir, process), &runtime);
            }
            Err(_) => warn!(
                app = %app,
                dir = %dir.display(),
                "Deploy abandoned outside a runtime, candidate left behind"
            ),
        }
    }
}

/// Rolls the record back if the deploy is dropped before a terminal state
struct PendingDeploy<'a> {
    record: &'a AppRecord,
    prior: Option<PriorState>,
}

impl PendingDeploy<'_> {
    fn settle(&mut self) -> Option<PriorState> {
        self.prior.take()
    }
}

impl Drop for PendingDeploy<'_> {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            let err = DomainError::Abandoned("stopped before reaching a terminal state".into());
            warn!(app = %self.record.name(), "Deploy abandoned, rolling back");
            self.record.roll_back(prior, &err);
        }
    }
}

/// Marks the app unavailable if its current instance exits on its own
async fn watch_for_exit(record: Arc<AppRecord>, handle: ProcessHandle) {
    let outcome = handle.wait().await;
    if record.mark_exited(handle.id(), outcome) {
        warn!(
            app = %record.name(),
            pid = handle.pid(),
            outcome = %outcome,
            "Current instance exited unexpectedly"
        );
    }
}

struct DeployLogs {
    build: Arc<LogBuffer>,
    console: Arc<LogBuffer>,
    progress: Arc<DetachableSink>,
}

impl DeployLogs {
    fn build_sink(&self) -> SharedSink {
        Arc::new(TeeSink::new(vec![
            self.build.clone() as SharedSink,
            self.progress.clone(),
        ]))
    }

    fn console_sink(&self) -> SharedSink {
        Arc::new(TeeSink::new(vec![
            self.console.clone() as SharedSink,
            self.progress.clone(),
        ]))
    }

    /// Fill in captured output on errors that carry it
    fn attach(&self, err: DomainError) -> DomainError {
        match err {
            DomainError::BuildFailure { cause, build_log } if build_log.is_empty() => {
                DomainError::BuildFailure {
                    cause,
                    build_log: self.build.text(),
                }
            }
            DomainError::StartFailure { cause, output } if output.is_empty() => {
                DomainError::StartFailure {
                    cause,
                    output: self.console.text(),
                }
            }
            DomainError::HealthCheckTimeout {
                timeout_secs,
                console_log,
            } if console_log.is_empty() => DomainError::HealthCheckTimeout {
                timeout_secs,
                console_log: self.console.text(),
            },
            other => other,
        }
    }
}

struct DetachOnDrop(Arc<DetachableSink>);

impl Drop for DetachOnDrop {
    fn drop(&mut self) {
        self.0.detach();
    }
}

/// State machine bookkeeping of one attempt
struct DeployRun<'a> {
    app: &'a AppName,
    state: DeployState,
}

impl<'a> DeployRun<'a> {
    fn new(app: &'a AppName) -> Self {
        Self {
            app,
            state: DeployState::Idle,
        }
    }

    fn advance(&mut self, next: DeployState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid deploy transition {} -> {}",
            self.state,
            next
        );
        debug!(app = %self.app, from = %self.state, to = %next, "Deploy state transition");
        self.state = next;
    }
}
