// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Git source fetcher
//! Clones a repository on first deploy and updates the checkout in place on
//! later ones, using the git command line through the process supervisor.

use crate::domain::services::LogBuffer;
use crate::domain::{
    CommandSpec, DomainError, ProcessSupervisor, Result, SharedSink, SourceFetcher,
};
use crate::infrastructure::steps::run_step;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Upper bound on author lines read from `git log`
const MAX_LOG_LINES: usize = 100_000;

pub struct GitSourceFetcher {
    supervisor: Arc<dyn ProcessSupervisor>,
    git: String,
    timeout: Duration,
}

impl GitSourceFetcher {
    pub fn new(supervisor: Arc<dyn ProcessSupervisor>, git: impl Into<String>, timeout: Duration) -> Self {
        Self {
            supervisor,
            git: git.into(),
            timeout,
        }
    }

    fn command(&self, dir: &Path, args: &[&str]) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.git, dir)
            .args(args.iter().copied())
            .timeout(self.timeout);
        // Never block on a credential prompt
        spec.env
            .insert("GIT_TERMINAL_PROMPT".to_string(), "0".to_string());
        spec
    }

    async fn git(&self, dir: &Path, args: &[&str], log: &SharedSink) -> Result<()> {
        let spec = self.command(dir, args);
        let command_line = spec.display();
        match run_step(self.supervisor.as_ref(), spec, log.clone()).await {
            Ok(outcome) if outcome.success() => Ok(()),
            Ok(outcome) => Err(DomainError::FetchFailure(format!(
                "{command_line} failed with {outcome}"
            ))),
            Err(DomainError::StartFailure { cause, .. }) => Err(DomainError::FetchFailure(cause)),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SourceFetcher for GitSourceFetcher {
    async fn fetch_or_update(
        &self,
        source_url: &str,
        checkout_dir: &Path,
        log: SharedSink,
    ) -> Result<()> {
        if source_url.trim().is_empty() {
            return Err(DomainError::FetchFailure("source URL is empty".to_string()));
        }

        if checkout_dir.join(".git").is_dir() {
            info!(dir = %checkout_dir.display(), source = %source_url, "Updating checkout");
            self.git(checkout_dir, &["remote", "set-url", "origin", source_url], &log)
                .await?;
            self.git(checkout_dir, &["fetch", "origin", "HEAD"], &log)
                .await?;
            self.git(checkout_dir, &["reset", "--hard", "FETCH_HEAD"], &log)
                .await?;
            return self.git(checkout_dir, &["clean", "-fd"], &log).await;
        }

        let parent = checkout_dir.parent().ok_or_else(|| {
            DomainError::FetchFailure(format!("{} has no parent", checkout_dir.display()))
        })?;
        if checkout_dir.exists() {
            // Leftover of an interrupted clone
            tokio::fs::remove_dir_all(checkout_dir).await.map_err(|e| {
                DomainError::FetchFailure(format!(
                    "could not clear {}: {e}",
                    checkout_dir.display()
                ))
            })?;
        }
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            DomainError::FetchFailure(format!("could not create {}: {e}", parent.display()))
        })?;

        info!(dir = %checkout_dir.display(), source = %source_url, "Cloning repository");
        let target = checkout_dir.display().to_string();
        self.git(parent, &["clone", source_url, &target], &log).await
    }

    async fn contributors(&self, checkout_dir: &Path) -> Result<BTreeSet<String>> {
        let authors = Arc::new(LogBuffer::new(MAX_LOG_LINES));
        let spec = self.command(checkout_dir, &["log", "--format=%an"]);
        let outcome = self.supervisor.run(spec, authors.clone()).await?;
        if !outcome.success() {
            return Err(DomainError::FetchFailure(format!(
                "git log failed with {outcome}"
            )));
        }
        Ok(authors
            .lines()
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }
}
