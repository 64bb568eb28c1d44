// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Availability value object
//! Externally observable readiness of an application record

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// Nothing is serving traffic for the app
    #[default]
    Unavailable,

    /// An instance exists but is not yet (or no longer) confirmed serving
    Starting,

    /// The current instance answered requests
    Available,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        *self == Availability::Available
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Unavailable => write!(f, "unavailable"),
            Availability::Starting => write!(f, "starting"),
            Availability::Available => write!(f, "available"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unavailable() {
        assert_eq!(Availability::default(), Availability::Unavailable);
        assert!(!Availability::default().is_available());
    }

    #[test]
    fn test_display() {
        assert_eq!(Availability::Available.to_string(), "available");
        assert_eq!(Availability::Starting.to_string(), "starting");
    }
}
