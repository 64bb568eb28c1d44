// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! OutputSink port
//! Receives child-process output line by line, as it is produced

use std::sync::Arc;

pub trait OutputSink: Send + Sync {
    /// Consume one line of output (without trailing newline)
    fn line(&self, line: &str);
}

pub type SharedSink = Arc<dyn OutputSink>;
