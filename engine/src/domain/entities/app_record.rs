// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! AppRecord entity
//! The registry's entry for one named application.
//!
//! Mutable state lives behind a single lock and every state change is one
//! critical section, so readers always observe a consistent record: an app
//! is never seen as available without a current instance. Deploys and
//! removals additionally serialize on the per-app deploy lock.

use crate::domain::services::LogBuffer;
use crate::domain::{
    AppName, Availability, DeployOutcome, DomainError, ExitOutcome, Instance, InstanceId,
    InstanceInfo,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, MutexGuard};

pub const STATUS_REGISTERED: &str = "Registered";
pub const STATUS_RUNNING: &str = "Running";
pub const STATUS_STOPPED: &str = "Stopped";

struct AppState {
    source_url: String,
    working_dir: Option<PathBuf>,
    availability: Availability,
    status: String,
    current: Option<Instance>,
    build_log: Arc<LogBuffer>,
    console_log: Arc<LogBuffer>,
    contributors: BTreeSet<String>,
    last_deploy: Option<DeployOutcome>,
    removed: bool,
}

/// What an app looked like before a deploy attempt touched it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorState {
    pub availability: Availability,
    pub status: String,
}

pub struct AppRecord {
    name: AppName,
    deploy_lock: Mutex<()>,
    state: RwLock<AppState>,
}

impl AppRecord {
    pub fn new(name: AppName, source_url: impl Into<String>, log_capacity: usize) -> Self {
        Self {
            name,
            deploy_lock: Mutex::new(()),
            state: RwLock::new(AppState {
                source_url: source_url.into(),
                working_dir: None,
                availability: Availability::Unavailable,
                status: STATUS_REGISTERED.to_string(),
                current: None,
                build_log: Arc::new(LogBuffer::new(log_capacity)),
                console_log: Arc::new(LogBuffer::new(log_capacity)),
                contributors: BTreeSet::new(),
                last_deploy: None,
                removed: false,
            }),
        }
    }

    pub fn name(&self) -> &AppName {
        &self.name
    }

    /// Wait for exclusive deploy rights on this app
    pub async fn lock_deploys(&self) -> MutexGuard<'_, ()> {
        self.deploy_lock.lock().await
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        match self.state.read() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn source_url(&self) -> String {
        self.read().source_url.clone()
    }

    pub fn set_source_url(&self, source_url: impl Into<String>) {
        self.write().source_url = source_url.into();
    }

    pub fn availability(&self) -> Availability {
        self.read().availability
    }

    pub fn status(&self) -> String {
        self.read().status.clone()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.write().status = status.into();
    }

    pub fn current(&self) -> Option<Instance> {
        self.read().current.clone()
    }

    pub fn is_removed(&self) -> bool {
        self.read().removed
    }

    pub fn last_deploy(&self) -> Option<DeployOutcome> {
        self.read().last_deploy.clone()
    }

    pub fn set_working_dir(&self, dir: PathBuf) {
        self.write().working_dir = Some(dir);
    }

    pub fn set_contributors(&self, contributors: BTreeSet<String>) {
        self.write().contributors = contributors;
    }

    pub fn build_log(&self) -> String {
        self.read().build_log.text()
    }

    pub fn console_log(&self) -> String {
        self.read().console_log.text()
    }

    /// Start a deploy attempt: fresh logs, a status line, and `Starting`
    /// availability if a current instance exists but is not serving.
    pub fn begin_deploy(
        &self,
        status: impl Into<String>,
        build_log: Arc<LogBuffer>,
        console_log: Arc<LogBuffer>,
    ) -> PriorState {
        let mut state = self.write();
        let prior = PriorState {
            availability: state.availability,
            status: state.status.clone(),
        };
        state.status = status.into();
        state.build_log = build_log;
        state.console_log = console_log;
        if state.current.is_some() && !state.availability.is_available() {
            state.availability = Availability::Starting;
        }
        prior
    }

    /// Atomically install `candidate` as the current instance and return the
    /// one it replaces.
    pub fn promote(&self, candidate: Instance) -> Option<Instance> {
        let mut state = self.write();
        let previous = state.current.replace(candidate);
        state.availability = Availability::Available;
        state.status = STATUS_RUNNING.to_string();
        state.last_deploy = Some(DeployOutcome::Promoted);
        previous
    }

    /// Conclude a failed deploy. The current instance is left untouched and
    /// availability returns to its value before the attempt, unless the
    /// instance was stopped or exited in the meantime.
    pub fn roll_back(&self, prior: PriorState, error: &DomainError) {
        let mut state = self.write();
        state.availability = if state.current.is_some() {
            prior.availability
        } else {
            Availability::Unavailable
        };
        state.status = if state.availability.is_available() {
            prior.status
        } else {
            format!("Deploy failed: {error}")
        };
        state.last_deploy = Some(DeployOutcome::RolledBack {
            kind: error.kind().to_string(),
            cause: error.to_string(),
        });
    }

    /// Detach the current instance for stopping; the app becomes unavailable
    pub fn take_current(&self, status: impl Into<String>) -> Option<Instance> {
        let mut state = self.write();
        state.availability = Availability::Unavailable;
        state.status = status.into();
        state.current.take()
    }

    /// Record that `instance` exited on its own. Ignored if it is no longer
    /// the current instance (replaced or stopped in the meantime).
    pub fn mark_exited(&self, instance: InstanceId, outcome: ExitOutcome) -> bool {
        let mut state = self.write();
        let is_current = state
            .current
            .as_ref()
            .is_some_and(|current| current.id() == instance);
        if !is_current {
            return false;
        }
        state.current = None;
        state.availability = Availability::Unavailable;
        state.status = format!("Crashed ({outcome})");
        true
    }

    /// Flag the record as removed and detach its current instance
    pub fn mark_removed(&self) -> Option<Instance> {
        let mut state = self.write();
        state.removed = true;
        state.availability = Availability::Unavailable;
        state.status = "Removed".to_string();
        state.current.take()
    }

    pub fn describe(&self) -> AppDescription {
        let state = self.read();
        AppDescription {
            name: self.name.to_string(),
            source_url: state.source_url.clone(),
            working_dir: state.working_dir.clone(),
            availability: state.availability,
            status: state.status.clone(),
            instance: state.current.as_ref().map(Instance::info),
            build_log: state.build_log.text(),
            console_log: state.console_log.text(),
            contributors: state.contributors.iter().cloned().collect(),
            last_deploy: state.last_deploy.clone(),
        }
    }
}

impl std::fmt::Debug for AppRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("AppRecord")
            .field("name", &self.name)
            .field("availability", &state.availability)
            .field("status", &state.status)
            .field("current", &state.current.as_ref().map(Instance::id))
            .finish()
    }
}

/// Read-only snapshot of an app, as returned by registry queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppDescription {
    pub name: String,
    pub source_url: String,
    pub working_dir: Option<PathBuf>,
    pub availability: Availability,
    pub status: String,
    pub instance: Option<InstanceInfo>,
    pub build_log: String,
    pub console_log: String,
    pub contributors: Vec<String>,
    pub last_deploy: Option<DeployOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdapterKind, ProcessHandle};
    use tokio::sync::watch;

    fn record() -> AppRecord {
        AppRecord::new(
            AppName::parse("demo").unwrap(),
            "https://example.com/demo.git",
            100,
        )
    }

    fn instance() -> (Instance, watch::Sender<Option<ExitOutcome>>) {
        let (tx, rx) = watch::channel(None);
        let handle = ProcessHandle::new(100, "./demo", rx, Arc::new(LogBuffer::new(10)));
        (
            Instance::new(handle, AdapterKind::Go, 8080, PathBuf::from("/tmp/i")),
            tx,
        )
    }

    fn fresh_logs() -> (Arc<LogBuffer>, Arc<LogBuffer>) {
        (Arc::new(LogBuffer::new(10)), Arc::new(LogBuffer::new(10)))
    }

    #[test]
    fn test_new_record_is_unavailable_without_instance() {
        let record = record();
        let desc = record.describe();
        assert_eq!(desc.availability, Availability::Unavailable);
        assert_eq!(desc.status, STATUS_REGISTERED);
        assert!(desc.instance.is_none());
        assert!(desc.last_deploy.is_none());
    }

    #[test]
    fn test_begin_deploy_without_instance_stays_unavailable() {
        let record = record();
        let (build, console) = fresh_logs();
        let prior = record.begin_deploy("Fetching", build, console);
        assert_eq!(prior.availability, Availability::Unavailable);
        assert_eq!(record.availability(), Availability::Unavailable);
        assert_eq!(record.status(), "Fetching");
    }

    #[test]
    fn test_promote_swaps_current() {
        let record = record();
        let (first, _tx1) = instance();
        let (second, _tx2) = instance();
        let first_id = first.id();

        assert!(record.promote(first).is_none());
        assert_eq!(record.availability(), Availability::Available);

        let previous = record.promote(second.clone()).unwrap();
        assert_eq!(previous.id(), first_id);
        assert_eq!(record.current().unwrap().id(), second.id());
        assert_eq!(record.last_deploy(), Some(DeployOutcome::Promoted));
    }

    #[test]
    fn test_roll_back_restores_prior_availability() {
        let record = record();
        let (current, _tx) = instance();
        let current_id = current.id();
        record.promote(current);

        let (build, console) = fresh_logs();
        let prior = record.begin_deploy("Building", build, console);
        let err = DomainError::BuildFailure {
            cause: "go build exited with code 2".into(),
            build_log: String::new(),
        };
        record.roll_back(prior, &err);

        assert_eq!(record.availability(), Availability::Available);
        assert_eq!(record.status(), STATUS_RUNNING);
        assert_eq!(record.current().unwrap().id(), current_id);
        match record.last_deploy() {
            Some(DeployOutcome::RolledBack { kind, .. }) => assert_eq!(kind, "build_failure"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_roll_back_after_stop_stays_unavailable() {
        let record = record();
        let (current, _tx) = instance();
        record.promote(current);

        let (build, console) = fresh_logs();
        let prior = record.begin_deploy("Health checking", build, console);
        record.take_current(STATUS_STOPPED);
        record.roll_back(prior, &DomainError::start_failure("exited"));

        assert_eq!(record.availability(), Availability::Unavailable);
        assert!(record.status().starts_with("Deploy failed"));
    }

    #[test]
    fn test_mark_exited_only_applies_to_current() {
        let record = record();
        let (old, _tx1) = instance();
        let (new, _tx2) = instance();
        let old_id = old.id();
        record.promote(old);
        record.promote(new);

        let outcome = ExitOutcome {
            code: Some(1),
            signal: None,
        };
        assert!(!record.mark_exited(old_id, outcome));
        assert_eq!(record.availability(), Availability::Available);

        let current_id = record.current().unwrap().id();
        assert!(record.mark_exited(current_id, outcome));
        assert_eq!(record.availability(), Availability::Unavailable);
        assert_eq!(record.status(), "Crashed (exit code 1)");
        assert!(record.current().is_none());
    }

    #[test]
    fn test_take_current_and_remove() {
        let record = record();
        let (current, _tx) = instance();
        record.promote(current);

        assert!(record.take_current(STATUS_STOPPED).is_some());
        assert_eq!(record.availability(), Availability::Unavailable);
        assert!(record.take_current(STATUS_STOPPED).is_none());

        assert!(record.mark_removed().is_none());
        assert!(record.is_removed());
    }
}
