// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! AppRepository port
//! Storage of application records; the implementation owns name uniqueness

use crate::domain::{AppRecord, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Insert a new record; `NameConflict` if the name is already in use
    async fn insert(&self, record: Arc<AppRecord>) -> Result<()>;

    async fn find(&self, name: &str) -> Result<Option<Arc<AppRecord>>>;

    /// Remove and return the record, if present
    async fn remove(&self, name: &str) -> Result<Option<Arc<AppRecord>>>;

    async fn all(&self) -> Result<Vec<Arc<AppRecord>>>;
}
