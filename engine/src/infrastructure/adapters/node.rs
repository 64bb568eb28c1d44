// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Node adapter: `npm install`, `npm test`, then `npm start`

use super::Toolchain;
use crate::domain::services::ReadinessWaiter;
use crate::domain::{AdapterKind, BuildContext, BuildRunAdapter, ProcessHandle, Result, SharedSink};
use async_trait::async_trait;
use std::path::Path;

pub struct NodeAdapter {
    toolchain: Toolchain,
    npm: String,
}

impl NodeAdapter {
    pub fn new(toolchain: Toolchain, npm: impl Into<String>) -> Self {
        Self {
            toolchain,
            npm: npm.into(),
        }
    }
}

#[async_trait]
impl BuildRunAdapter for NodeAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Node
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join("package.json").is_file()
    }

    async fn build(&self, ctx: &BuildContext, build_log: SharedSink) -> Result<()> {
        self.toolchain
            .required(ctx, &self.npm, &["install"], &ctx.env, &build_log)
            .await?;
        self.toolchain
            .required(ctx, &self.npm, &["test"], &ctx.env, &build_log)
            .await
    }

    async fn run(
        &self,
        ctx: &BuildContext,
        console_log: SharedSink,
        readiness: ReadinessWaiter,
    ) -> Result<ProcessHandle> {
        self.toolchain
            .launch(ctx, &self.npm, &["start"], &ctx.env, console_log, readiness)
            .await
    }

    async fn stop(&self, handle: &ProcessHandle) -> Result<()> {
        self.toolchain.stop(handle).await
    }
}
