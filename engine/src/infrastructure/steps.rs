// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Build step runner
//! Runs one toolchain command for an adapter or the source fetcher: a
//! `Running <command>` header, then every output line prefixed with
//! `[<command>] `.

use crate::domain::services::PrefixedSink;
use crate::domain::{CommandSpec, ExitOutcome, ProcessSupervisor, Result, SharedSink};
use std::sync::Arc;
use tracing::info;

pub async fn run_step(
    supervisor: &dyn ProcessSupervisor,
    spec: CommandSpec,
    log: SharedSink,
) -> Result<ExitOutcome> {
    let command_line = spec.display();
    info!(command = %command_line, dir = %spec.working_dir.display(), "Running build step");
    log.line(&format!("Running {command_line}"));

    let prefixed: SharedSink = Arc::new(PrefixedSink::new(format!("[{command_line}] "), log));
    supervisor.run(spec, prefixed).await
}
