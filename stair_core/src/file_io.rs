//! # File I/O
//!
//! Reads and writes estimate files and the JSON reference tables.
//!
//! - **Atomic saves**: write to `.stw.tmp`, fsync, rename over the target
//! - **Locking**: an fs2 advisory lock plus a `.stw.lock` file naming the holder
//! - **Version check**: files from a newer schema are refused
//!
//! ## Example
//!
//! ```rust,no_run
//! use stair_core::estimate::EstimateFile;
//! use stair_core::file_io::{save_estimate, FileLock};
//! use std::path::Path;
//!
//! let estimate = EstimateFile::new("Dana", "26-001", "Client");
//! let path = Path::new("garden.stw");
//!
//! let lock = FileLock::acquire(path, "dana@example.com").unwrap();
//! save_estimate(&estimate, path).unwrap();
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::estimate::{EstimateFile, SCHEMA_VERSION};
use crate::tasks::{CarrierTable, TaskRateTable};

/// File extension of estimate files
pub const ESTIMATE_EXTENSION: &str = "stw";

/// Locks older than this are treated as abandoned (hours)
const STALE_LOCK_HOURS: i64 = 24;

/// Contents of a `.stw.lock` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Who holds the lock (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Whether the holder is gone: a dead process on this machine, or a lock
    /// older than a day
    fn is_stale(&self) -> bool {
        if hostname().as_deref() == Some(self.machine.as_str()) && !process_alive(self.pid) {
            return true;
        }
        (Utc::now() - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    fs::metadata(format!("/proc/{}", pid)).is_ok()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive hold on an estimate file, released on drop.
pub struct FileLock {
    estimate_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on an estimate file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired
    /// * `Err(CalcError::FileLocked)` - Someone else holds it
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = read_lock_info(&lock_path).ok().filter(|i| !i.is_stale()) {
            return Err(CalcError::file_locked(
                path.display().to_string(),
                format!("{} ({})", existing.user_id, existing.machine),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(|e| CalcError::SerializationError {
            reason: e.to_string(),
        })?;
        lock_file
            .write_all(lock_json.as_bytes())
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), user = %info.user_id, "estimate locked");
        Ok(FileLock {
            estimate_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Current holder, if the file is locked
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path)).ok().filter(|i| !i.is_stale())
    }

    pub fn estimate_path(&self) -> &Path {
        &self.estimate_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!(path = %self.lock_path.display(), error = %e, "could not remove lock file");
        }
    }
}

/// `garden.stw` -> `garden.stw.lock`
fn lock_path_for(estimate_path: &Path) -> PathBuf {
    let mut lock_path = estimate_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_to_string(path: &Path) -> CalcResult<String> {
    let mut file = File::open(path).map_err(|e| CalcError::file_error("open", path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let contents = read_to_string(lock_path)?;
    serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError { reason: e.to_string() })
}

/// Read any JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CalcResult<T> {
    let contents = read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Load a task-rate table (a JSON array of rates)
pub fn load_task_rates(path: &Path) -> CalcResult<TaskRateTable> {
    let table: TaskRateTable = read_json(path)?;
    debug!(path = %path.display(), rates = table.len(), "task rates loaded");
    Ok(table)
}

/// Load a carrier table (a JSON array of carriers)
pub fn load_carriers(path: &Path) -> CalcResult<CarrierTable> {
    read_json(path)
}

/// Save an estimate atomically.
///
/// Written to a `.tmp` sibling, synced, then renamed over `path`, so an
/// interrupted save never leaves a half-written estimate.
pub fn save_estimate(estimate: &EstimateFile, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(estimate).map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension(format!("{}.tmp", ESTIMATE_EXTENSION));
    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .sync_all()
        .map_err(|e| CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(path = %path.display(), items = estimate.item_count(), "estimate saved");
    Ok(())
}

/// Load an estimate and check its schema version.
///
/// # Returns
///
/// * `Ok(EstimateFile)` - Loaded
/// * `Err(CalcError::VersionMismatch)` - Written by a newer schema
/// * `Err(CalcError::SerializationError)` - Invalid JSON
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_estimate(path: &Path) -> CalcResult<EstimateFile> {
    let estimate: EstimateFile = read_json(path)?;
    validate_version(&estimate.meta.version)?;
    debug!(path = %path.display(), items = estimate.item_count(), "estimate loaded");
    Ok(estimate)
}

/// Load an estimate along with whoever currently holds its lock
pub fn load_estimate_with_lock_check(path: &Path) -> CalcResult<(EstimateFile, Option<LockInfo>)> {
    let estimate = load_estimate(path)?;
    Ok((estimate, FileLock::check(path)))
}

/// Major versions must match; within 0.x a newer minor is refused.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let (Some(&file_major), Some(&current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::fixtures::scenario_input;
    use crate::calculations::CalculationItem;
    use std::env::temp_dir;

    fn temp_estimate_path(name: &str) -> PathBuf {
        temp_dir().join(format!("stepwise_test_{}.stw", name))
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/jobs/garden.stw"));
        assert_eq!(lock_path, Path::new("/jobs/garden.stw.lock"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_estimate_path("roundtrip");
        let mut estimate = EstimateFile::new("Dana", "TEST-001", "Test Client");
        estimate.add_item(CalculationItem::LStair(scenario_input()));
        save_estimate(&estimate, &path).unwrap();

        let loaded = load_estimate(&path).unwrap();
        assert_eq!(loaded.meta.estimator, "Dana");
        assert_eq!(loaded.meta.job_id, "TEST-001");
        assert_eq!(loaded.item_count(), 1);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_estimate_path("atomic");
        let tmp_path = path.with_extension("stw.tmp");

        save_estimate(&EstimateFile::default(), &path).unwrap();
        assert!(!tmp_path.exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let path = temp_estimate_path("lock_test");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "dana@example.com").unwrap();
        assert_eq!(lock.info.user_id, "dana@example.com");
        assert_eq!(lock.estimate_path(), path.as_path());
        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_newer_file_refused() {
        let path = temp_estimate_path("newer");
        let mut estimate = EstimateFile::default();
        estimate.meta.version = "0.9.0".to_string();
        save_estimate(&estimate, &path).unwrap();

        let err = load_estimate(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_estimate_path("lock_check");
        save_estimate(&EstimateFile::new("Dana", "TEST", "Client"), &path).unwrap();

        let (loaded, lock_info) = load_estimate_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "TEST");
        assert!(lock_info.is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_reference_tables() {
        let rates_path = temp_dir().join("stepwise_test_rates.json");
        fs::write(
            &rates_path,
            r#"[{ "name": "mixing mortar", "unit": "batch", "estimated_hours": 0.5 }]"#,
        )
        .unwrap();
        let rates = load_task_rates(&rates_path).unwrap();
        assert_eq!(rates.len(), 1);

        let carriers_path = temp_dir().join("stepwise_test_carriers.json");
        fs::write(&carriers_path, r#"[{ "name": "dumper", "tonnage": 1.0, "speed_kmh": 5.0 }]"#).unwrap();
        let carriers = load_carriers(&carriers_path).unwrap();
        assert!(carriers.find(1.0).is_some());

        let missing = load_task_rates(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(missing.error_code(), "FILE_ERROR");

        let _ = fs::remove_file(&rates_path);
        let _ = fs::remove_file(&carriers_path);
    }
}
