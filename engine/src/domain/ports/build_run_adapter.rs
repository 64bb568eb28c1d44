// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! BuildRunAdapter port
//! Ecosystem-specific build and run strategy

use crate::domain::services::ReadinessWaiter;
use crate::domain::{AdapterKind, AppName, ProcessHandle, Result, SharedSink};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything an adapter needs to build and run one instance
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub app_name: AppName,
    /// Directory holding this instance's copy of the project
    pub project_dir: PathBuf,
    /// Caller-supplied and engine-provided variables for every process
    pub env: BTreeMap<String, String>,
}

impl BuildContext {
    /// Environment with ecosystem variables added; on a key collision the
    /// value already present in the context wins.
    pub fn env_with<I, K, V>(&self, extra: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env = self.env.clone();
        for (key, value) in extra {
            env.entry(key.into()).or_insert_with(|| value.into());
        }
        env
    }
}

/// Port for building and running a project of one ecosystem
#[async_trait]
pub trait BuildRunAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Whether the project in `project_dir` belongs to this ecosystem
    fn detect(&self, project_dir: &Path) -> bool;

    /// Fetch dependencies, compile and test. Output goes to `build_log`.
    async fn build(&self, ctx: &BuildContext, build_log: SharedSink) -> Result<()>;

    /// Start the built artifact. The adapter marks `readiness` once the
    /// process has been launched; it never claims the app is serving.
    async fn run(
        &self,
        ctx: &BuildContext,
        console_log: SharedSink,
        readiness: ReadinessWaiter,
    ) -> Result<ProcessHandle>;

    async fn stop(&self, handle: &ProcessHandle) -> Result<()>;
}
