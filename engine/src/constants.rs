// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Application-wide constants and default values

/// Deployment protocol defaults
pub mod deploy {
    /// Delay between two reachability polls of a candidate (milliseconds)
    pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 500;

    /// Overall deadline for a candidate to become reachable (seconds)
    pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SEC: u64 = 60;

    /// Timeout of a single reachability request (milliseconds)
    pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

    /// Wall-clock limit of one build sub-step (seconds, 20 minutes)
    pub const DEFAULT_BUILD_STEP_TIMEOUT_SEC: u64 = 20 * 60;

    /// Wall-clock limit of one source fetch command (seconds)
    pub const DEFAULT_FETCH_TIMEOUT_SEC: u64 = 300;

    /// How long the daemon waits for in-flight deploys at shutdown before
    /// abandoning them
    pub const SHUTDOWN_DRAIN_TIMEOUT_SEC: u64 = 30;
}

/// Process supervision defaults
pub mod process {
    /// Grace window between SIGTERM and SIGKILL when stopping an instance (seconds)
    pub const DEFAULT_STOP_GRACE_SEC: u64 = 10;

    /// How long to wait for a process to disappear after SIGKILL (seconds)
    pub const SIGKILL_WAIT_SEC: u64 = 5;
}

/// Captured log defaults
pub mod logs {
    /// Lines kept per build/console log; older lines are dropped
    pub const DEFAULT_LOG_CAPACITY_LINES: usize = 5_000;
}

/// Toolchain executables
pub mod toolchain {
    pub const DEFAULT_GIT: &str = "git";
    pub const DEFAULT_GO: &str = "go";
    pub const DEFAULT_MAVEN: &str = "mvn";
    pub const DEFAULT_JAVA: &str = "java";
    pub const DEFAULT_NPM: &str = "npm";
}

/// Environment variables handed to every application process
pub mod app_env {
    pub const APP_NAME: &str = "APP_NAME";
    pub const APP_PORT: &str = "APP_PORT";
    pub const APP_DATA: &str = "APP_DATA";
    pub const TEMP: &str = "TEMP";
    pub const GOPATH: &str = "GOPATH";
}

/// Default location of checkouts, instances and app data
pub const DEFAULT_DATA_DIR: &str = "/var/lib/apprunner";
