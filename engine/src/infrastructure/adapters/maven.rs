// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Maven adapter: `mvn -B clean package`, then `java -jar` on the built jar

use super::Toolchain;
use crate::domain::services::ReadinessWaiter;
use crate::domain::{
    AdapterKind, BuildContext, BuildRunAdapter, DomainError, ProcessHandle, Result, SharedSink,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct MavenAdapter {
    toolchain: Toolchain,
    mvn: String,
    java: String,
}

impl MavenAdapter {
    pub fn new(toolchain: Toolchain, mvn: impl Into<String>, java: impl Into<String>) -> Self {
        Self {
            toolchain,
            mvn: mvn.into(),
            java: java.into(),
        }
    }
}

/// First runnable jar in `target/`, by file name
fn find_jar(project_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(project_dir.join("target")).ok()?;
    let mut jars: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            name.ends_with(".jar")
                && !name.ends_with("-sources.jar")
                && !name.ends_with("-javadoc.jar")
                && !name.starts_with("original-")
        })
        .collect();
    jars.sort();
    jars.into_iter().next()
}

#[async_trait]
impl BuildRunAdapter for MavenAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Maven
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join("pom.xml").is_file()
    }

    async fn build(&self, ctx: &BuildContext, build_log: SharedSink) -> Result<()> {
        self.toolchain
            .required(ctx, &self.mvn, &["-B", "clean", "package"], &ctx.env, &build_log)
            .await
    }

    async fn run(
        &self,
        ctx: &BuildContext,
        console_log: SharedSink,
        readiness: ReadinessWaiter,
    ) -> Result<ProcessHandle> {
        let jar = find_jar(&ctx.project_dir).ok_or_else(|| {
            DomainError::start_failure(format!(
                "no jar found in {}",
                ctx.project_dir.join("target").display()
            ))
        })?;
        let jar = jar.display().to_string();
        self.toolchain
            .launch(ctx, &self.java, &["-jar", &jar], &ctx.env, console_log, readiness)
            .await
    }

    async fn stop(&self, handle: &ProcessHandle) -> Result<()> {
        self.toolchain.stop(handle).await
    }
}
