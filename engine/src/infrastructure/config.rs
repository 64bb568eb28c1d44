// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Configuration loading from a YAML file
//!
//! Every section is optional; missing values fall back to the defaults in
//! `constants`.

use crate::constants::{DEFAULT_DATA_DIR, deploy, logs, process, toolchain};
use crate::domain::services::DeploySettings;
use crate::domain::{AppName, DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Extra variables for every app process
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub apps: Vec<AppConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,

    #[serde(default = "default_health_check_timeout_sec")]
    pub health_check_timeout_sec: u64,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_build_step_timeout_sec")]
    pub build_step_timeout_sec: u64,

    #[serde(default = "default_fetch_timeout_sec")]
    pub fetch_timeout_sec: u64,

    #[serde(default = "default_stop_grace_sec")]
    pub stop_grace_sec: u64,

    #[serde(default = "default_log_capacity_lines")]
    pub log_capacity_lines: usize,
}

/// Executables of the supported toolchains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default = "default_git")]
    pub git: String,

    #[serde(default = "default_go")]
    pub go: String,

    #[serde(default = "default_maven")]
    pub maven: String,

    #[serde(default = "default_java")]
    pub java: String,

    #[serde(default = "default_npm")]
    pub npm: String,
}

/// An app registered at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Inferred from `source_url` when absent
    #[serde(default)]
    pub name: Option<String>,

    pub source_url: String,

    #[serde(default = "default_true")]
    pub deploy_on_start: bool,
}

impl AppConfig {
    pub fn app_name(&self) -> Result<AppName> {
        match &self.name {
            Some(name) => AppName::parse(name.as_str()),
            None => AppName::from_url(&self.source_url),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_health_check_interval_ms() -> u64 {
    deploy::DEFAULT_HEALTH_CHECK_INTERVAL_MS
}

fn default_health_check_timeout_sec() -> u64 {
    deploy::DEFAULT_HEALTH_CHECK_TIMEOUT_SEC
}

fn default_probe_timeout_ms() -> u64 {
    deploy::DEFAULT_PROBE_TIMEOUT_MS
}

fn default_build_step_timeout_sec() -> u64 {
    deploy::DEFAULT_BUILD_STEP_TIMEOUT_SEC
}

fn default_fetch_timeout_sec() -> u64 {
    deploy::DEFAULT_FETCH_TIMEOUT_SEC
}

fn default_stop_grace_sec() -> u64 {
    process::DEFAULT_STOP_GRACE_SEC
}

fn default_log_capacity_lines() -> usize {
    logs::DEFAULT_LOG_CAPACITY_LINES
}

fn default_git() -> String {
    toolchain::DEFAULT_GIT.to_string()
}

fn default_go() -> String {
    toolchain::DEFAULT_GO.to_string()
}

fn default_maven() -> String {
    toolchain::DEFAULT_MAVEN.to_string()
}

fn default_java() -> String {
    toolchain::DEFAULT_JAVA.to_string()
}

fn default_npm() -> String {
    toolchain::DEFAULT_NPM.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            health_check_interval_ms: default_health_check_interval_ms(),
            health_check_timeout_sec: default_health_check_timeout_sec(),
            probe_timeout_ms: default_probe_timeout_ms(),
            build_step_timeout_sec: default_build_step_timeout_sec(),
            fetch_timeout_sec: default_fetch_timeout_sec(),
            stop_grace_sec: default_stop_grace_sec(),
            log_capacity_lines: default_log_capacity_lines(),
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            git: default_git(),
            go: default_go(),
            maven: default_maven(),
            java: default_java(),
            npm: default_npm(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            deploy: DeployConfig::default(),
            toolchain: ToolchainConfig::default(),
            env: BTreeMap::new(),
            apps: Vec::new(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DomainError::InvalidConfiguration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&contents).map_err(|e| match e {
            DomainError::InvalidConfiguration(msg) => {
                DomainError::InvalidConfiguration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(contents).map_err(|e| {
            DomainError::InvalidConfiguration(format!("Failed to parse YAML: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(DomainError::InvalidConfiguration(msg.to_string()));
        if self.deploy.health_check_interval_ms == 0 {
            return invalid("deploy.health_check_interval_ms must be positive");
        }
        if self.deploy.health_check_timeout_sec == 0 {
            return invalid("deploy.health_check_timeout_sec must be positive");
        }
        if self.deploy.probe_timeout_ms == 0 {
            return invalid("deploy.probe_timeout_ms must be positive");
        }
        if self.deploy.build_step_timeout_sec == 0 || self.deploy.fetch_timeout_sec == 0 {
            return invalid("deploy step timeouts must be positive");
        }
        if self.deploy.log_capacity_lines == 0 {
            return invalid("deploy.log_capacity_lines must be positive");
        }

        let mut seen = HashSet::new();
        for app in &self.apps {
            let name = app.app_name().map_err(|e| {
                DomainError::InvalidConfiguration(format!("app '{}': {}", app.source_url, e))
            })?;
            if !seen.insert(name.to_string()) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "Duplicate app name: '{name}'"
                )));
            }
        }
        Ok(())
    }

    pub fn deploy_settings(&self) -> DeploySettings {
        DeploySettings {
            data_dir: self.data_dir.clone(),
            health_check_interval: Duration::from_millis(self.deploy.health_check_interval_ms),
            health_check_timeout: Duration::from_secs(self.deploy.health_check_timeout_sec),
            probe_timeout: Duration::from_millis(self.deploy.probe_timeout_ms),
            env: self.env.clone(),
            log_capacity: self.deploy.log_capacity_lines,
        }
    }

    pub fn build_step_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy.build_step_timeout_sec)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy.fetch_timeout_sec)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.deploy.stop_grace_sec)
    }

    /// Isolated dependency roots of Go apps
    pub fn gopath_root(&self) -> PathBuf {
        self.data_dir.join("gopath")
    }
}
