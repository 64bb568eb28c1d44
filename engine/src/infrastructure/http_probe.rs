// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! HTTP reachability probe
//! A plain GET; any HTTP response, whatever its status, means reachable

use crate::domain::ReachabilityProbe;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub struct HttpReachabilityProbe {
    timeout: Duration,
}

impl HttpReachabilityProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        let url = url.to_string();
        let timeout = self.timeout;
        // ureq is blocking
        tokio::task::spawn_blocking(move || probe(&url, timeout))
            .await
            .unwrap_or(false)
    }
}

fn probe(url: &str, timeout: Duration) -> bool {
    let agent = ureq::AgentBuilder::new()
        .timeout(timeout)
        .redirects(0)
        .build();

    match agent.get(url).call() {
        Ok(response) => {
            debug!(url = %url, status = response.status(), "Probe answered");
            true
        }
        Err(ureq::Error::Status(code, _)) => {
            debug!(url = %url, status = code, "Probe answered with error status");
            true
        }
        Err(ureq::Error::Transport(e)) => {
            debug!(url = %url, error = %e, "Probe got no response");
            false
        }
    }
}
