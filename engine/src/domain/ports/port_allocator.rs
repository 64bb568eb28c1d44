// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! PortAllocator port

use crate::domain::Result;

pub trait PortAllocator: Send + Sync {
    /// A currently free local TCP port for a candidate instance
    fn allocate(&self) -> Result<u16>;
}
