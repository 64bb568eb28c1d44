// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! DeployState value object
//! States of the deployment protocol state machine

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeployState {
    #[default]
    Idle,
    Fetching,
    Building,
    Starting,
    HealthChecking,
    Promoted,
    RolledBack,
}

impl DeployState {
    /// Promoted and RolledBack end a deploy and release the per-app lock
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployState::Promoted | DeployState::RolledBack)
    }

    pub fn can_transition_to(&self, next: DeployState) -> bool {
        use DeployState::*;

        match (self, next) {
            (Idle, Fetching) => true,
            (Fetching, Building) => true,
            (Building, Starting) => true,
            (Starting, HealthChecking) => true,
            (HealthChecking, Promoted) => true,

            // Any non-terminal state after Idle can fail
            (Fetching | Building | Starting | HealthChecking, RolledBack) => true,

            _ => false,
        }
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployState::Idle => write!(f, "idle"),
            DeployState::Fetching => write!(f, "fetching"),
            DeployState::Building => write!(f, "building"),
            DeployState::Starting => write!(f, "starting"),
            DeployState::HealthChecking => write!(f, "health-checking"),
            DeployState::Promoted => write!(f, "promoted"),
            DeployState::RolledBack => write!(f, "rolled-back"),
        }
    }
}

/// Final result of a deploy attempt, kept on the record for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeployOutcome {
    Promoted,
    RolledBack { kind: String, cause: String },
}

impl fmt::Display for DeployOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployOutcome::Promoted => write!(f, "promoted"),
            DeployOutcome::RolledBack { kind, cause } => {
                write!(f, "rolled back ({kind}): {cause}")
            }
        }
    }
}
