// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Go adapter
//! `go get` (best-effort), `go build -o <app>`, `go test`, then the binary.
//! Each app gets its own GOPATH under the data directory.

use super::Toolchain;
use crate::constants::app_env;
use crate::domain::services::ReadinessWaiter;
use crate::domain::{AdapterKind, BuildContext, BuildRunAdapter, ProcessHandle, Result, SharedSink};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct GoAdapter {
    toolchain: Toolchain,
    go: String,
    gopath_root: PathBuf,
}

impl GoAdapter {
    pub fn new(toolchain: Toolchain, go: impl Into<String>, gopath_root: PathBuf) -> Self {
        Self {
            toolchain,
            go: go.into(),
            gopath_root,
        }
    }

    fn env(&self, ctx: &BuildContext) -> BTreeMap<String, String> {
        let gopath = self.gopath_root.join(ctx.app_name.as_str());
        ctx.env_with([(app_env::GOPATH, gopath.display().to_string())])
    }
}

#[async_trait]
impl BuildRunAdapter for GoAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Go
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join("go.mod").is_file() || project_dir.join("main.go").is_file()
    }

    async fn build(&self, ctx: &BuildContext, build_log: SharedSink) -> Result<()> {
        let env = self.env(ctx);
        self.toolchain
            .best_effort(ctx, &self.go, &["get"], &env, &build_log)
            .await;
        self.toolchain
            .required(
                ctx,
                &self.go,
                &["build", "-o", ctx.app_name.as_str()],
                &env,
                &build_log,
            )
            .await?;
        self.toolchain
            .required(ctx, &self.go, &["test"], &env, &build_log)
            .await
    }

    async fn run(
        &self,
        ctx: &BuildContext,
        console_log: SharedSink,
        readiness: ReadinessWaiter,
    ) -> Result<ProcessHandle> {
        let binary = ctx.project_dir.join(ctx.app_name.as_str());
        let binary = binary.display().to_string();
        self.toolchain
            .launch(ctx, &binary, &[], &self.env(ctx), console_log, readiness)
            .await
    }

    async fn stop(&self, handle: &ProcessHandle) -> Result<()> {
        self.toolchain.stop(handle).await
    }
}
