// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod adapter_kind;
pub mod app_name;
pub mod availability;
pub mod deploy_state;
pub mod instance_id;

pub use adapter_kind::AdapterKind;
pub use app_name::AppName;
pub use availability::Availability;
pub use deploy_state::{DeployOutcome, DeployState};
pub use instance_id::InstanceId;
