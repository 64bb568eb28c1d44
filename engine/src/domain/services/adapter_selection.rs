// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Adapter selection
//! Adapters are tried in a fixed priority order; the first whose detection
//! matches the project wins.

use crate::domain::{BuildRunAdapter, DomainError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct AdapterSelector {
    adapters: Vec<Arc<dyn BuildRunAdapter>>,
}

impl AdapterSelector {
    /// `adapters` in priority order, highest first
    pub fn new(adapters: Vec<Arc<dyn BuildRunAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn select(&self, project_dir: &Path) -> Result<Arc<dyn BuildRunAdapter>> {
        for adapter in &self.adapters {
            if adapter.detect(project_dir) {
                debug!(
                    adapter = %adapter.kind(),
                    dir = %project_dir.display(),
                    "Selected build-run adapter"
                );
                return Ok(adapter.clone());
            }
        }
        Err(DomainError::UnsupportedProjectType(
            project_dir.display().to_string(),
        ))
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
