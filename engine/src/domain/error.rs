// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Domain-level errors
//! Every failure a deploy can end in is recovered at the deployment protocol
//! boundary and surfaced as one of these variants; none of them is fatal for
//! the host process.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // Registry errors
    #[error("There is already an app called '{0}'")]
    NameConflict(String),

    #[error("No app found with name '{0}'")]
    NotFound(String),

    #[error("Invalid app name: {0}")]
    InvalidName(String),

    #[error("Invalid source URL: {0}")]
    InvalidSourceUrl(String),

    // Deploy errors
    #[error("Could not fetch source: {0}")]
    FetchFailure(String),

    #[error("No suitable runner found for the project in {0}")]
    UnsupportedProjectType(String),

    #[error("Build failed: {cause}")]
    BuildFailure { cause: String, build_log: String },

    #[error("Could not start app: {cause}")]
    StartFailure { cause: String, output: String },

    #[error("App did not respond within {timeout_secs}s")]
    HealthCheckTimeout { timeout_secs: u64, console_log: String },

    #[error("Process supervisor fault: {0}")]
    SupervisorFault(String),

    #[error("Deploy abandoned: {0}")]
    Abandoned(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DomainError {
    /// Stable label of the error class, used in logs and deploy outcomes
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NameConflict(_) => "name_conflict",
            DomainError::NotFound(_) => "not_found",
            DomainError::InvalidName(_) => "invalid_name",
            DomainError::InvalidSourceUrl(_) => "invalid_source_url",
            DomainError::FetchFailure(_) => "fetch_failure",
            DomainError::UnsupportedProjectType(_) => "unsupported_project_type",
            DomainError::BuildFailure { .. } => "build_failure",
            DomainError::StartFailure { .. } => "start_failure",
            DomainError::HealthCheckTimeout { .. } => "health_check_timeout",
            DomainError::SupervisorFault(_) => "supervisor_fault",
            DomainError::Abandoned(_) => "abandoned",
            DomainError::InvalidConfiguration(_) => "invalid_configuration",
        }
    }

    pub(crate) fn start_failure(cause: impl Into<String>) -> Self {
        DomainError::StartFailure {
            cause: cause.into(),
            output: String::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
