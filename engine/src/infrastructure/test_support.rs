// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Scripted process supervisor for adapter and fetcher tests

use crate::domain::services::LogBuffer;
use crate::domain::{CommandSpec, ExitOutcome, ProcessHandle, ProcessSupervisor, Result, SharedSink};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Records every command; exit codes and output are scripted per
/// `"<program> <first arg>"` key
#[derive(Default)]
pub(crate) struct RecordingSupervisor {
    specs: Mutex<Vec<CommandSpec>>,
    exit_codes: HashMap<String, i32>,
    outputs: HashMap<String, Vec<String>>,
    running: Mutex<Vec<watch::Sender<Option<ExitOutcome>>>>,
}

fn key(spec: &CommandSpec) -> String {
    match spec.args.first() {
        Some(arg) => format!("{} {}", spec.program, arg),
        None => spec.program.clone(),
    }
}

impl RecordingSupervisor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn exit_code(mut self, key: &str, code: i32) -> Self {
        self.exit_codes.insert(key.to_string(), code);
        self
    }

    pub(crate) fn output(mut self, key: &str, lines: &[&str]) -> Self {
        self.outputs
            .insert(key.to_string(), lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub(crate) fn specs(&self) -> Vec<CommandSpec> {
        self.specs.lock().unwrap().clone()
    }

    /// `display()` of every recorded command, in order
    pub(crate) fn commands(&self) -> Vec<String> {
        self.specs().iter().map(CommandSpec::display).collect()
    }
}

#[async_trait]
impl ProcessSupervisor for RecordingSupervisor {
    async fn run(&self, spec: CommandSpec, sink: SharedSink) -> Result<ExitOutcome> {
        let key = key(&spec);
        for line in self.outputs.get(&key).into_iter().flatten() {
            sink.line(line);
        }
        self.specs.lock().unwrap().push(spec);
        Ok(ExitOutcome {
            code: Some(self.exit_codes.get(&key).copied().unwrap_or(0)),
            signal: None,
        })
    }

    async fn start(&self, spec: CommandSpec, sink: SharedSink) -> Result<ProcessHandle> {
        sink.line("started");
        let (tx, rx) = watch::channel(None);
        self.running.lock().unwrap().push(tx);
        let handle = ProcessHandle::new(4242, spec.display(), rx, Arc::new(LogBuffer::new(10)));
        self.specs.lock().unwrap().push(spec);
        Ok(handle)
    }

    async fn stop(&self, _handle: &ProcessHandle) -> Result<()> {
        for tx in self.running.lock().unwrap().drain(..) {
            let _ = tx.send(Some(ExitOutcome {
                code: None,
                signal: Some(15),
            }));
        }
        Ok(())
    }
}
