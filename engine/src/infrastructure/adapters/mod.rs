// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Build-run adapters
//! One adapter per supported ecosystem, registered in a fixed priority
//! order: Maven, Node, Go.

mod go;
mod maven;
mod node;

pub use go::GoAdapter;
pub use maven::MavenAdapter;
pub use node::NodeAdapter;

use crate::domain::services::{AdapterSelector, ReadinessWaiter};
use crate::domain::{
    BuildContext, BuildRunAdapter, CommandSpec, DomainError, ProcessHandle, ProcessSupervisor,
    Result, SharedSink,
};
use crate::infrastructure::config::ToolchainConfig;
use crate::infrastructure::steps::run_step;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shared plumbing: run build steps and launch the built artifact
#[derive(Clone)]
pub struct Toolchain {
    supervisor: Arc<dyn ProcessSupervisor>,
    step_timeout: Duration,
}

impl Toolchain {
    pub fn new(supervisor: Arc<dyn ProcessSupervisor>, step_timeout: Duration) -> Self {
        Self {
            supervisor,
            step_timeout,
        }
    }

    fn spec(
        &self,
        ctx: &BuildContext,
        program: &str,
        args: &[&str],
        env: &BTreeMap<String, String>,
    ) -> CommandSpec {
        CommandSpec::new(program, &ctx.project_dir)
            .args(args.iter().copied())
            .envs(env)
    }

    /// A step the build cannot do without
    pub async fn required(
        &self,
        ctx: &BuildContext,
        program: &str,
        args: &[&str],
        env: &BTreeMap<String, String>,
        log: &SharedSink,
    ) -> Result<()> {
        let spec = self.spec(ctx, program, args, env).timeout(self.step_timeout);
        let command_line = spec.display();
        match run_step(self.supervisor.as_ref(), spec, log.clone()).await {
            Ok(outcome) if outcome.success() => Ok(()),
            Ok(outcome) => Err(DomainError::BuildFailure {
                cause: format!("{command_line} failed with {outcome}"),
                build_log: String::new(),
            }),
            Err(DomainError::StartFailure { cause, output }) => Err(DomainError::BuildFailure {
                cause,
                build_log: output,
            }),
            Err(e) => Err(e),
        }
    }

    /// A step whose failure is logged and otherwise ignored
    pub async fn best_effort(
        &self,
        ctx: &BuildContext,
        program: &str,
        args: &[&str],
        env: &BTreeMap<String, String>,
        log: &SharedSink,
    ) {
        let spec = self.spec(ctx, program, args, env).timeout(self.step_timeout);
        let command_line = spec.display();
        let failure = match run_step(self.supervisor.as_ref(), spec, log.clone()).await {
            Ok(outcome) if outcome.success() => return,
            Ok(outcome) => outcome.to_string(),
            Err(e) => e.to_string(),
        };
        warn!(app = %ctx.app_name, command = %command_line, failure = %failure, "Optional build step failed");
        log.line(&format!("{command_line} failed ({failure}), continuing"));
    }

    /// Start the long-running process and report the launch
    pub async fn launch(
        &self,
        ctx: &BuildContext,
        program: &str,
        args: &[&str],
        env: &BTreeMap<String, String>,
        console_log: SharedSink,
        readiness: ReadinessWaiter,
    ) -> Result<ProcessHandle> {
        let spec = self.spec(ctx, program, args, env);
        console_log.line(&format!("Running {}", spec.display()));
        let handle = self.supervisor.start(spec, console_log).await?;
        info!(app = %ctx.app_name, pid = handle.pid(), command = %handle.command(), "App process launched");
        readiness.mark_issued(handle.pid());
        Ok(handle)
    }

    pub async fn stop(&self, handle: &ProcessHandle) -> Result<()> {
        self.supervisor.stop(handle).await
    }
}

/// The adapters of every supported ecosystem, in priority order
pub fn standard_adapters(
    toolchain: Toolchain,
    executables: &ToolchainConfig,
    gopath_root: PathBuf,
) -> AdapterSelector {
    let adapters: Vec<Arc<dyn BuildRunAdapter>> = vec![
        Arc::new(MavenAdapter::new(
            toolchain.clone(),
            &executables.maven,
            &executables.java,
        )),
        Arc::new(NodeAdapter::new(toolchain.clone(), &executables.npm)),
        Arc::new(GoAdapter::new(toolchain, &executables.go, gopath_root)),
    ];
    AdapterSelector::new(adapters)
}
