// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod adapter_selection;
pub mod deployment_protocol;
pub mod instance_dirs;
pub mod output;
pub mod progress;
pub mod readiness;

pub use adapter_selection::AdapterSelector;
pub use deployment_protocol::{DeployReport, DeploySettings, DeploymentProtocol, health_url};
pub use output::{DetachableSink, LogBuffer, PrefixedSink, TeeSink};
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSender, progress_channel};
pub use readiness::{Launched, ReadinessSignal, ReadinessWaiter, readiness_pair};
