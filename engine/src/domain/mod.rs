// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Domain layer
//! Entities, value objects, ports and services of the app host

pub mod entities;
pub mod error;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{AppDescription, AppRecord, Instance, InstanceInfo};
pub use error::{DomainError, Result};
pub use ports::{
    AppRepository, BuildContext, BuildRunAdapter, CommandSpec, ExitOutcome, OutputSink,
    PortAllocator, ProcessHandle, ProcessSupervisor, ReachabilityProbe, SharedSink,
    SourceFetcher,
};
pub use value_objects::{
    AdapterKind, AppName, Availability, DeployOutcome, DeployState, InstanceId,
};
