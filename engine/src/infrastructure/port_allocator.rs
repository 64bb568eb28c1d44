// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Local port allocator
//! Asks the OS for a free loopback port by binding port 0

use crate::domain::{DomainError, PortAllocator, Result};
use std::net::{Ipv4Addr, TcpListener};

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPortAllocator;

impl PortAllocator for LocalPortAllocator {
    fn allocate(&self) -> Result<u16> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .map_err(|e| DomainError::SupervisorFault(format!("no free port: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| DomainError::SupervisorFault(format!("no free port: {e}")))?
            .port();
        Ok(port)
    }
}
