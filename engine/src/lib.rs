// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! apprunner engine
//!
//! Registers git-hosted applications, builds them with the toolchain of
//! their ecosystem, runs them as supervised child processes and redeploys
//! them without downtime: a candidate instance is built and started next to
//! the serving one and only promoted once it answers HTTP requests.

pub mod application;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::Estate;
pub use domain::{DomainError, Result};
