// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! SourceFetcher port
//! Clones or updates an application's source checkout

use crate::domain::{Result, SharedSink};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Clone `source_url` into `checkout_dir`, or update the existing
    /// checkout in place. Idempotent. Failures are `FetchFailure`.
    async fn fetch_or_update(
        &self,
        source_url: &str,
        checkout_dir: &Path,
        log: SharedSink,
    ) -> Result<()>;

    /// Names of the commit authors of the checkout
    async fn contributors(&self, checkout_dir: &Path) -> Result<BTreeSet<String>>;
}
