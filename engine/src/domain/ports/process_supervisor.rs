// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! ProcessSupervisor port
//! Interface for running build steps and long-running app processes

use crate::domain::services::LogBuffer;
use crate::domain::{InstanceId, Result, SharedSink};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;

/// What to launch, where, and with which environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    /// Wall-clock limit; the process is killed when it expires
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, working_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.as_ref().to_path_buf(),
            env: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `program arg1 arg2`, for log lines and step prefixes
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a supervised process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit status could not be collected
    pub fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "signal {signal}"),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}

/// Handle to a launched process
///
/// The child itself is owned by a watcher task inside the supervisor, which
/// publishes the exit outcome; handles are cheap to clone and only observe.
#[derive(Clone)]
pub struct ProcessHandle {
    id: InstanceId,
    pid: u32,
    command: String,
    started_at: SystemTime,
    exit: watch::Receiver<Option<ExitOutcome>>,
    output: Arc<LogBuffer>,
}

impl ProcessHandle {
    pub fn new(
        pid: u32,
        command: impl Into<String>,
        exit: watch::Receiver<Option<ExitOutcome>>,
        output: Arc<LogBuffer>,
    ) -> Self {
        Self {
            id: InstanceId::generate(),
            pid,
            command: command.into(),
            started_at: SystemTime::now(),
            exit,
            output,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn is_alive(&self) -> bool {
        self.exit.borrow().is_none()
    }

    pub fn exit_outcome(&self) -> Option<ExitOutcome> {
        *self.exit.borrow()
    }

    /// Output captured so far (bounded)
    pub fn output(&self) -> String {
        self.output.text()
    }

    /// Wait until the process has exited
    pub async fn wait(&self) -> ExitOutcome {
        let mut exit = self.exit.clone();
        match exit.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => outcome.unwrap_or_else(ExitOutcome::unknown),
            // Watcher gone without publishing: the child is no longer observable
            Err(_) => ExitOutcome::unknown(),
        }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("command", &self.command)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Port for supervised process execution
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    /// Run a command to completion, streaming its output to `sink`.
    ///
    /// Spawn failures and timeouts are `StartFailure`; a process that ran
    /// and exited is `Ok` whatever its exit code.
    async fn run(&self, spec: CommandSpec, sink: SharedSink) -> Result<ExitOutcome>;

    /// Launch a long-running process, streaming its output to `sink`
    async fn start(&self, spec: CommandSpec, sink: SharedSink) -> Result<ProcessHandle>;

    /// Terminate gracefully, escalating to a forced kill after the grace
    /// window. Stopping an already-stopped handle is a no-op.
    async fn stop(&self, handle: &ProcessHandle) -> Result<()>;

    fn is_alive(&self, handle: &ProcessHandle) -> bool {
        handle.is_alive()
    }
}
