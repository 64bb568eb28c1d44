// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod app_repository;
pub mod build_run_adapter;
pub mod output_sink;
pub mod port_allocator;
pub mod process_supervisor;
pub mod reachability_probe;
pub mod source_fetcher;

pub use app_repository::AppRepository;
pub use build_run_adapter::{BuildContext, BuildRunAdapter};
pub use output_sink::{OutputSink, SharedSink};
pub use port_allocator::PortAllocator;
pub use process_supervisor::{CommandSpec, ExitOutcome, ProcessHandle, ProcessSupervisor};
pub use reachability_probe::ReachabilityProbe;
pub use source_fetcher::SourceFetcher;
