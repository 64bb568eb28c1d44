// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Daemon configuration from environment variables
//!
//! Everything else comes from the YAML file named by `APPRUNNER_CONFIG_FILE`.

use std::env;
use std::path::PathBuf;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// YAML configuration file; defaults apply when unset
    pub config_file: Option<PathBuf>,

    /// Overrides `data_dir` of the YAML file
    pub data_dir: Option<PathBuf>,

    /// Log filter directive
    pub log_level: String,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            config_file: non_empty("APPRUNNER_CONFIG_FILE").map(PathBuf::from),
            data_dir: non_empty("APPRUNNER_DATA_DIR").map(PathBuf::from),
            // Priority: APPRUNNER_LOG_LEVEL > RUST_LOG > default
            log_level: non_empty("APPRUNNER_LOG_LEVEL")
                .or_else(|| non_empty("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}
