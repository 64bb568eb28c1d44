// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Deploy progress stream
//! A push-based channel carrying a deploy's output lines to a caller,
//! followed by exactly one terminal event.

use crate::domain::OutputSink;
use std::sync::Mutex;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Line(String),
    /// Terminal event; `Err` carries the human-readable cause
    Finished(Result<(), String>),
}

/// Producer half; usable as an output sink
pub struct ProgressSender {
    tx: Mutex<Option<mpsc::UnboundedSender<ProgressEvent>>>,
}

impl ProgressSender {
    /// Emit the terminal event and close the stream. Later lines are dropped.
    pub fn finish(&self, outcome: Result<(), String>) {
        let tx = match self.tx.lock() {
            Ok(mut tx) => tx.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = tx {
            let _ = tx.send(ProgressEvent::Finished(outcome));
        }
    }
}

impl OutputSink for ProgressSender {
    fn line(&self, line: &str) {
        if let Ok(guard) = self.tx.lock()
            && let Some(tx) = guard.as_ref()
        {
            // Receiver gone: the caller stopped listening, the deploy goes on
            let _ = tx.send(ProgressEvent::Line(line.to_string()));
        }
    }
}

pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Next event, or `None` once the stream is closed
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Drain the stream, returning all lines and the terminal outcome
    pub async fn collect(mut self) -> (Vec<String>, Option<Result<(), String>>) {
        let mut lines = Vec::new();
        while let Some(event) = self.next().await {
            match event {
                ProgressEvent::Line(line) => lines.push(line),
                ProgressEvent::Finished(outcome) => return (lines, Some(outcome)),
            }
        }
        (lines, None)
    }
}

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressSender {
            tx: Mutex::new(Some(tx)),
        },
        ProgressReceiver { rx },
    )
}
