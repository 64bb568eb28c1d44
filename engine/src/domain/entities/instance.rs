// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Instance entity
//! One launched process of an app, together with the directory and port it
//! was started with.

use crate::domain::{AdapterKind, InstanceId, ProcessHandle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub struct Instance {
    handle: ProcessHandle,
    adapter: AdapterKind,
    port: u16,
    dir: PathBuf,
}

impl Instance {
    pub fn new(handle: ProcessHandle, adapter: AdapterKind, port: u16, dir: PathBuf) -> Self {
        Self {
            handle,
            adapter,
            port,
            dir,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.handle.id()
    }

    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    pub fn adapter(&self) -> AdapterKind {
        self.adapter
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn info(&self) -> InstanceInfo {
        InstanceInfo {
            id: self.id(),
            pid: self.handle.pid(),
            adapter: self.adapter,
            port: self.port,
            dir: self.dir.clone(),
            started_at: self.handle.started_at(),
            alive: self.handle.is_alive(),
        }
    }
}

/// Serializable snapshot of an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub pid: u32,
    pub adapter: AdapterKind,
    pub port: u16,
    pub dir: PathBuf,
    pub started_at: SystemTime,
    pub alive: bool,
}
