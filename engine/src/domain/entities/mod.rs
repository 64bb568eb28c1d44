// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod app_record;
pub mod instance;

pub use app_record::{AppDescription, AppRecord, PriorState};
pub use instance::{Instance, InstanceInfo};
