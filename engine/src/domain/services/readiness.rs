// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Readiness waiter
//! One-shot signal from an adapter that its run command has been issued.
//! Being issued says nothing about serving traffic; that is decided by
//! polling the reachability probe afterwards.

use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launched {
    pub pid: u32,
}

/// Adapter half
#[derive(Debug)]
pub struct ReadinessWaiter {
    tx: oneshot::Sender<Launched>,
}

impl ReadinessWaiter {
    /// Consumes the waiter, so a launch can be reported only once
    pub fn mark_issued(self, pid: u32) {
        let _ = self.tx.send(Launched { pid });
    }
}

/// Protocol half
#[derive(Debug)]
pub struct ReadinessSignal {
    rx: oneshot::Receiver<Launched>,
}

impl ReadinessSignal {
    /// Resolves once the adapter marked the launch, or `None` when the
    /// adapter dropped its waiter without doing so.
    pub async fn issued(self) -> Option<Launched> {
        self.rx.await.ok()
    }
}

pub fn readiness_pair() -> (ReadinessWaiter, ReadinessSignal) {
    let (tx, rx) = oneshot::channel();
    (ReadinessWaiter { tx }, ReadinessSignal { rx })
}
