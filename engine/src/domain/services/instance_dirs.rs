// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Instance directories
//! Every deploy builds and runs in its own copy of the checkout, so a
//! candidate never touches the files of the instance currently serving.

use crate::domain::{DomainError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Directory names never copied into an instance
const SKIPPED_DIRS: &[&str] = &[".git"];

/// Copy `source` into `target`, skipping VCS metadata
pub fn copy_project(source: &Path, target: &Path) -> Result<()> {
    fs::create_dir_all(target).map_err(|e| {
        DomainError::SupervisorFault(format!("Failed to create {}: {}", target.display(), e))
    })?;

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && SKIPPED_DIRS.iter().any(|skip| entry.file_name() == *skip))
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            DomainError::SupervisorFault(format!("Failed to read {}: {}", source.display(), e))
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| DomainError::SupervisorFault(e.to_string()))?;
        let destination = target.join(relative);

        let file_type = entry.file_type();
        let copied = if file_type.is_dir() {
            fs::create_dir_all(&destination)
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &destination)
        } else {
            fs::copy(entry.path(), &destination).map(|_| ())
        };
        copied.map_err(|e| {
            DomainError::SupervisorFault(format!(
                "Failed to copy {} to {}: {}",
                entry.path().display(),
                destination.display(),
                e
            ))
        })?;
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, destination: &Path) -> std::io::Result<()> {
    let target = fs::read_link(link)?;
    std::os::unix::fs::symlink(target, destination)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, destination: &Path) -> std::io::Result<()> {
    fs::copy(link, destination).map(|_| ())
}

/// Best-effort removal; a leftover directory is logged, not fatal
pub fn remove_instance_dir(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(dir = %dir.display(), error = %e, "Failed to remove instance directory");
    }
}

/// `<data_dir>/instances/<app>/<instance>`
pub fn instance_dir(data_dir: &Path, app: &str, instance: &str) -> PathBuf {
    data_dir.join("instances").join(app).join(instance)
}

/// Where the project copy of an instance lives
pub fn project_dir(instance_dir: &Path) -> PathBuf {
    instance_dir.join("project")
}

/// Scratch directory handed to the app as `TEMP`
pub fn temp_dir(instance_dir: &Path) -> PathBuf {
    instance_dir.join("tmp")
}

/// `<data_dir>/data/<app>`, kept across deploys
pub fn app_data_dir(data_dir: &Path, app: &str) -> PathBuf {
    data_dir.join("data").join(app)
}

/// Create an instance directory holding a copy of `checkout`
pub fn prepare_instance(checkout: &Path, instance_dir: &Path, app_data: &Path) -> Result<()> {
    copy_project(checkout, &project_dir(instance_dir))?;
    for dir in [temp_dir(instance_dir), app_data.to_path_buf()] {
        fs::create_dir_all(&dir).map_err(|e| {
            DomainError::SupervisorFault(format!("Failed to create {}: {}", dir.display(), e))
        })?;
    }
    Ok(())
}

/// `<data_dir>/repos/<app>`
pub fn checkout_dir(data_dir: &Path, app: &str) -> PathBuf {
    data_dir.join("repos").join(app)
}
