// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! ReachabilityProbe port
//! Decides whether a candidate instance answers requests

use async_trait::async_trait;

#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// True when the address produced any response at all; the status code
    /// does not matter.
    async fn is_reachable(&self, url: &str) -> bool;
}
