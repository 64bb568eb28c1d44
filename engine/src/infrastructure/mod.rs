// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Infrastructure layer
//! Concrete implementations of the domain ports

pub mod adapters;
pub mod config;
pub mod git_fetcher;
pub mod http_probe;
pub mod in_memory_repository;
pub mod port_allocator;
pub mod steps;
pub mod tokio_supervisor;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use git_fetcher::GitSourceFetcher;
pub use http_probe::HttpReachabilityProbe;
pub use in_memory_repository::InMemoryAppRepository;
pub use port_allocator::LocalPortAllocator;
pub use tokio_supervisor::TokioProcessSupervisor;
