// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! In-memory app repository
//! Thread-safe implementation of the AppRepository port

use crate::domain::{AppRecord, AppRepository, DomainError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

#[derive(Clone, Default)]
pub struct InMemoryAppRepository {
    apps: Arc<RwLock<HashMap<String, Arc<AppRecord>>>>,
}

impl InMemoryAppRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> DomainError {
    DomainError::SupervisorFault("app repository lock poisoned".to_string())
}

#[async_trait]
impl AppRepository for InMemoryAppRepository {
    async fn insert(&self, record: Arc<AppRecord>) -> Result<()> {
        let name = record.name().to_string();
        let mut apps = self.apps.write().map_err(poisoned)?;
        if apps.contains_key(&name) {
            return Err(DomainError::NameConflict(name));
        }
        apps.insert(name.clone(), record);

        info!(app = %name, total_apps = apps.len(), "App registered");
        Ok(())
    }

    async fn find(&self, name: &str) -> Result<Option<Arc<AppRecord>>> {
        let apps = self.apps.read().map_err(poisoned)?;
        Ok(apps.get(name).cloned())
    }

    async fn remove(&self, name: &str) -> Result<Option<Arc<AppRecord>>> {
        debug!(app = %name, "Removing app from repository");
        let mut apps = self.apps.write().map_err(poisoned)?;
        Ok(apps.remove(name))
    }

    async fn all(&self) -> Result<Vec<Arc<AppRecord>>> {
        let apps = self.apps.read().map_err(poisoned)?;
        Ok(apps.values().cloned().collect())
    }
}
