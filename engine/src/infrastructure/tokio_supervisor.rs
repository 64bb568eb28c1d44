// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Tokio process supervisor
//! Spawns children in their own process group, forwards their output line by
//! line while they run, and stops them with SIGTERM escalating to SIGKILL.

use crate::constants::process::SIGKILL_WAIT_SEC;
use crate::domain::services::{LogBuffer, TeeSink};
use crate::domain::{
    CommandSpec, DomainError, ExitOutcome, ProcessHandle, ProcessSupervisor, Result, SharedSink,
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Lines of output kept on each handle for error reports
const CAPTURE_LINES: usize = 200;

/// How long to keep reading output after the child exited
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

pub struct TokioProcessSupervisor {
    stop_grace: Duration,
}

impl TokioProcessSupervisor {
    pub fn new(stop_grace: Duration) -> Self {
        Self { stop_grace }
    }

    fn launch(&self, spec: &CommandSpec, sink: SharedSink) -> Result<ProcessHandle> {
        let command_line = spec.display();
        let mut child = command(spec).spawn().map_err(|e| spawn_error(&command_line, e))?;
        let pid = child.id().ok_or_else(|| {
            DomainError::SupervisorFault(format!("{command_line} exited before its pid was known"))
        })?;
        debug!(pid = pid, command = %command_line, dir = %spec.working_dir.display(), "Process spawned");

        let capture = Arc::new(LogBuffer::new(CAPTURE_LINES));
        let output: SharedSink = Arc::new(TeeSink::new(vec![capture.clone() as SharedSink, sink]));
        let mut pumps: Vec<JoinHandle<()>> = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(forward_lines(stdout, output.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(forward_lines(stderr, output)));
        }

        let (tx, rx) = watch::channel(None);
        tokio::spawn(async move {
            let outcome = match child.wait().await {
                Ok(status) => exit_outcome(status),
                Err(e) => {
                    warn!(pid = pid, error = %e, "Failed to collect exit status");
                    ExitOutcome::unknown()
                }
            };
            // Publish only after the output is in, so waiters see all of it
            let _ = timeout(OUTPUT_DRAIN_TIMEOUT, async {
                for pump in pumps {
                    let _ = pump.await;
                }
            })
            .await;
            debug!(pid = pid, outcome = %outcome, "Process exited");
            let _ = tx.send(Some(outcome));
        });

        Ok(ProcessHandle::new(pid, command_line, rx, capture))
    }
}

impl Default for TokioProcessSupervisor {
    fn default() -> Self {
        Self::new(Duration::from_secs(
            crate::constants::process::DEFAULT_STOP_GRACE_SEC,
        ))
    }
}

#[async_trait]
impl ProcessSupervisor for TokioProcessSupervisor {
    async fn run(&self, spec: CommandSpec, sink: SharedSink) -> Result<ExitOutcome> {
        let handle = self.launch(&spec, sink)?;
        let _abandon = KillGroupOnDrop(handle.clone());
        let Some(limit) = spec.timeout else {
            return Ok(handle.wait().await);
        };

        match timeout(limit, handle.wait()).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => {
                warn!(
                    pid = handle.pid(),
                    command = %handle.command(),
                    timeout_secs = limit.as_secs(),
                    "Command timed out, killing it"
                );
                signal_group(handle.pid(), GroupSignal::Kill)?;
                let _ = timeout(Duration::from_secs(SIGKILL_WAIT_SEC), handle.wait()).await;
                Err(DomainError::StartFailure {
                    cause: format!(
                        "{} timed out after {}s",
                        handle.command(),
                        limit.as_secs()
                    ),
                    output: handle.output(),
                })
            }
        }
    }

    async fn start(&self, spec: CommandSpec, sink: SharedSink) -> Result<ProcessHandle> {
        let handle = self.launch(&spec, sink)?;
        info!(pid = handle.pid(), command = %handle.command(), "Process started");
        Ok(handle)
    }

    async fn stop(&self, handle: &ProcessHandle) -> Result<()> {
        if !handle.is_alive() {
            // The leader is gone but what it forked may not be
            return signal_group(handle.pid(), GroupSignal::Kill);
        }

        info!(pid = handle.pid(), command = %handle.command(), "Sending SIGTERM");
        signal_group(handle.pid(), GroupSignal::Terminate)?;
        if timeout(self.stop_grace, handle.wait()).await.is_ok() {
            return signal_group(handle.pid(), GroupSignal::Kill);
        }

        warn!(
            pid = handle.pid(),
            grace_secs = self.stop_grace.as_secs(),
            "Stop timeout reached, sending SIGKILL"
        );
        signal_group(handle.pid(), GroupSignal::Kill)?;
        if timeout(Duration::from_secs(SIGKILL_WAIT_SEC), handle.wait())
            .await
            .is_err()
        {
            return Err(DomainError::SupervisorFault(format!(
                "process {} still running after SIGKILL",
                handle.pid()
            )));
        }
        Ok(())
    }
}

/// Kills the process group of a supervised run whose caller went away
struct KillGroupOnDrop(ProcessHandle);

impl Drop for KillGroupOnDrop {
    fn drop(&mut self) {
        if self.0.is_alive() {
            debug!(pid = self.0.pid(), command = %self.0.command(), "Run abandoned, killing it");
            let _ = signal_group(self.0.pid(), GroupSignal::Kill);
        }
    }
}

fn command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.working_dir)
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // Own group, so a stop reaches everything the command forked
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

fn spawn_error(command_line: &str, e: std::io::Error) -> DomainError {
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => DomainError::StartFailure {
            cause: format!("could not launch {command_line}: {e}"),
            output: String::new(),
        },
        _ => DomainError::SupervisorFault(format!("could not spawn {command_line}: {e}")),
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, sink: SharedSink) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                sink.line(line.trim_end_matches(['\n', '\r']));
            }
            Err(e) => {
                debug!(error = %e, "Output stream closed");
                break;
            }
        }
    }
}

fn exit_outcome(status: ExitStatus) -> ExitOutcome {
    #[cfg(unix)]
    let signal = std::os::unix::process::ExitStatusExt::signal(&status);
    #[cfg(not(unix))]
    let signal = None;
    ExitOutcome {
        code: status.code(),
        signal,
    }
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: GroupSignal) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let sig = match signal {
        GroupSignal::Terminate => Signal::SIGTERM,
        GroupSignal::Kill => Signal::SIGKILL,
    };
    match killpg(Pid::from_raw(pid as i32), sig) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(DomainError::SupervisorFault(format!(
            "failed to send {sig} to process group {pid}: {e}"
        ))),
    }
}

#[cfg(not(unix))]
fn signal_group(pid: u32, _signal: GroupSignal) -> Result<()> {
    Err(DomainError::SupervisorFault(format!(
        "cannot signal process {pid}: process groups need a unix host"
    )))
}
