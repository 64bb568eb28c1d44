// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Output sinks
//! Bounded log buffers and the combinators used to route process output to
//! several consumers at once.

use crate::domain::{OutputSink, SharedSink};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Keeps the most recent `capacity` lines
#[derive(Debug)]
pub struct LogBuffer {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: Mutex::new(VecDeque::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    /// Buffered lines joined with newlines
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputSink for LogBuffer {
    fn line(&self, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.to_string());
    }
}

/// Copies every line to each inner sink
pub struct TeeSink {
    sinks: Vec<SharedSink>,
}

impl TeeSink {
    pub fn new(sinks: Vec<SharedSink>) -> Self {
        Self { sinks }
    }
}

impl OutputSink for TeeSink {
    fn line(&self, line: &str) {
        for sink in &self.sinks {
            sink.line(line);
        }
    }
}

/// Prepends a fixed prefix to every line
pub struct PrefixedSink {
    prefix: String,
    inner: SharedSink,
}

impl PrefixedSink {
    pub fn new(prefix: impl Into<String>, inner: SharedSink) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }
}

impl OutputSink for PrefixedSink {
    fn line(&self, line: &str) {
        self.inner.line(&format!("{}{}", self.prefix, line));
    }
}

/// Forwards lines until detached; afterwards drops them
pub struct DetachableSink {
    inner: Mutex<Option<SharedSink>>,
}

impl DetachableSink {
    pub fn new(inner: SharedSink) -> Self {
        Self {
            inner: Mutex::new(Some(inner)),
        }
    }

    pub fn detach(&self) {
        match self.inner.lock() {
            Ok(mut inner) => *inner = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

impl OutputSink for DetachableSink {
    fn line(&self, line: &str) {
        let inner = self.inner.lock().ok().and_then(|inner| inner.clone());
        if let Some(sink) = inner {
            sink.line(line);
        }
    }
}
