//! Shared fixtures for end-to-end tests
//!
//! Apps are shell scripts: `build.sh` is the build step and `app.sh` the
//! long-running process, both run by the real process supervisor. An app is
//! "reachable" once it created `ready-<port>` in the marker directory.

#![allow(dead_code)]

use apprunner_engine::Estate;
use apprunner_engine::domain::services::instance_dirs::copy_project;
use apprunner_engine::domain::services::{
    AdapterSelector, DeploySettings, DeploymentProtocol, LogBuffer, ReadinessWaiter,
};
use apprunner_engine::domain::{
    AdapterKind, Availability, BuildContext, BuildRunAdapter, ProcessHandle, ProcessSupervisor,
    ReachabilityProbe, Result, SharedSink, SourceFetcher,
};
use apprunner_engine::infrastructure::adapters::Toolchain;
use apprunner_engine::infrastructure::{
    InMemoryAppRepository, LocalPortAllocator, TokioProcessSupervisor,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const OK_BUILD: &str = "echo building\n";
pub const FAILING_BUILD: &str = "echo broken >&2\nexit 2\n";
pub const READY_APP: &str = "touch \"$MARKER_DIR/ready-$APP_PORT\"\necho \"serving $APP_NAME on $APP_PORT\"\nexec sleep 60\n";
pub const SILENT_APP: &str = "echo $$ > \"$MARKER_DIR/silent-pid\"\necho starting\nexec sleep 60\n";
pub const CRASHING_APP: &str = "echo boom\nexit 3\n";
/// Serves like `READY_APP` but takes a second to shut down
pub const SLOW_STOPPING_APP: &str = "trap 'sleep 1; exit 0' TERM\ntouch \"$MARKER_DIR/ready-$APP_PORT\"\nsleep 60 &\nwait\n";
/// Records its pid, then hangs in the build
pub const HANGING_BUILD: &str = "echo $$ > \"$MARKER_DIR/build-pid\"\nexec sleep 60\n";

/// Copies the directory named by the source URL into the checkout
pub struct LocalDirFetcher;

#[async_trait]
impl SourceFetcher for LocalDirFetcher {
    async fn fetch_or_update(&self, source_url: &str, checkout_dir: &Path, log: SharedSink) -> Result<()> {
        let source = PathBuf::from(source_url);
        let checkout = checkout_dir.to_path_buf();
        if checkout.exists() {
            std::fs::remove_dir_all(&checkout).ok();
        }
        tokio::task::spawn_blocking(move || copy_project(&source, &checkout))
            .await
            .expect("copy task")?;
        log.line("fetched");
        Ok(())
    }

    async fn contributors(&self, _checkout_dir: &Path) -> Result<BTreeSet<String>> {
        Ok(BTreeSet::from(["Tester".to_string()]))
    }
}

/// `build.sh` then `app.sh`
pub struct ShellAdapter {
    toolchain: Toolchain,
}

#[async_trait]
impl BuildRunAdapter for ShellAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Go
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join("app.sh").is_file()
    }

    async fn build(&self, ctx: &BuildContext, build_log: SharedSink) -> Result<()> {
        self.toolchain
            .required(ctx, "/bin/sh", &["build.sh"], &ctx.env, &build_log)
            .await
    }

    async fn run(
        &self,
        ctx: &BuildContext,
        console_log: SharedSink,
        readiness: ReadinessWaiter,
    ) -> Result<ProcessHandle> {
        self.toolchain
            .launch(ctx, "/bin/sh", &["app.sh"], &ctx.env, console_log, readiness)
            .await
    }

    async fn stop(&self, handle: &ProcessHandle) -> Result<()> {
        self.toolchain.stop(handle).await
    }
}

/// Reachable once the app dropped its ready marker
pub struct MarkerProbe {
    dir: PathBuf,
}

#[async_trait]
impl ReachabilityProbe for MarkerProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        // http://127.0.0.1:<port>/<app>/
        let port = url
            .rsplit(':')
            .next()
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default();
        self.dir.join(format!("ready-{port}")).exists()
    }
}

pub struct Harness {
    pub estate: Arc<Estate>,
    pub data: TempDir,
    pub markers: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_health_timeout(Duration::from_millis(1500))
    }

    pub fn with_health_timeout(health_check_timeout: Duration) -> Self {
        let data = tempfile::tempdir().unwrap();
        let markers = tempfile::tempdir().unwrap();

        let supervisor: Arc<dyn ProcessSupervisor> =
            Arc::new(TokioProcessSupervisor::new(Duration::from_secs(2)));
        let adapter = Arc::new(ShellAdapter {
            toolchain: Toolchain::new(supervisor.clone(), Duration::from_secs(30)),
        });
        let mut env = BTreeMap::new();
        env.insert(
            "MARKER_DIR".to_string(),
            markers.path().display().to_string(),
        );

        let protocol = DeploymentProtocol::new(
            Arc::new(LocalDirFetcher),
            AdapterSelector::new(vec![adapter]),
            supervisor,
            Arc::new(MarkerProbe {
                dir: markers.path().to_path_buf(),
            }),
            Arc::new(LocalPortAllocator),
            DeploySettings {
                data_dir: data.path().to_path_buf(),
                health_check_interval: Duration::from_millis(20),
                health_check_timeout,
                probe_timeout: Duration::from_millis(200),
                env,
                log_capacity: 500,
            },
        );

        Self {
            estate: Arc::new(Estate::new(
                Arc::new(InMemoryAppRepository::new()),
                Arc::new(protocol),
            )),
            data,
            markers,
        }
    }

    pub fn marker(&self, name: &str) -> PathBuf {
        self.markers.path().join(name)
    }

    pub fn read_marker(&self, name: &str) -> String {
        std::fs::read_to_string(self.marker(name)).unwrap_or_default()
    }
}

/// A source directory holding `build.sh` and, if given, `app.sh`
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new(build: &str, app: Option<&str>) -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        project.write(build, app);
        project
    }

    pub fn write(&self, build: &str, app: Option<&str>) {
        std::fs::write(self.dir.path().join("build.sh"), build).unwrap();
        match app {
            Some(app) => std::fs::write(self.dir.path().join("app.sh"), app).unwrap(),
            None => {
                let _ = std::fs::remove_file(self.dir.path().join("app.sh"));
            }
        }
    }

    pub fn url(&self) -> String {
        self.dir.path().display().to_string()
    }
}

/// A zombie counts as gone
pub fn pid_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    if kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // pid (comm) state ...
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .and_then(|rest| rest.trim_start().chars().next())
            != Some('Z'),
        Err(_) => !cfg!(target_os = "linux"),
    }
}

/// Captures a deploy's progress lines
pub fn progress() -> Arc<LogBuffer> {
    Arc::new(LogBuffer::new(1000))
}

/// Poll the app until it reaches `availability` or `timeout` passes
pub async fn wait_for_availability(
    estate: &Estate,
    name: &str,
    availability: Availability,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let current = estate.find(name).await.map(|desc| desc.availability);
        if current == Ok(availability) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Poll until `pid` is gone or `timeout` passes
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while pid_alive(pid) {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    true
}

/// Poll until the marker file has content and parse it as a pid
pub async fn wait_for_pid_marker(harness: &Harness, name: &str) -> u32 {
    for _ in 0..250 {
        if let Ok(pid) = harness.read_marker(name).trim().parse() {
            return pid;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{name} was never written");
}
