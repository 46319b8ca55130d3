//! # File I/O Module
//!
//! Handles shop data file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent concurrent edits from two terminals or hosts
//! - **Version validation**: Ensure schema compatibility (semver)
//!
//! ## File Format
//!
//! Shop data is saved as pretty-printed JSON. Lock files add a `.lock`
//! suffix to the extension and carry metadata about who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use calc_core::file_io::{save_shop, load_shop, FileLock};
//! use calc_core::shop::ShopData;
//! use std::path::Path;
//!
//! let shop = ShopData::new("Atelier 7", "admin");
//! let path = Path::new("shop.json");
//!
//! // Acquire lock before saving
//! let lock = FileLock::acquire(path, "admin").unwrap();
//!
//! // Save with atomic write
//! save_shop(&shop, path).unwrap();
//!
//! // Lock is released when dropped
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::shop::{ShopData, SCHEMA_VERSION};

/// Locks older than this are treated as abandoned
const STALE_LOCK_HOURS: i64 = 24;

/// Lock file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (login or email)
    pub user_id: String,
    /// Host where the lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
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

/// File lock guard that releases the lock when dropped.
///
/// Uses both:
/// 1. OS-level file locking (via fs2) for process safety
/// 2. A .lock file with metadata for user visibility
pub struct FileLock {
    data_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a shop data file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(CalcError::FileLocked)` - Another process holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    tracing::warn!(path = %path.display(), holder = %existing.user_id, "data file is locked");
                    return Err(CalcError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                tracing::info!(path = %path.display(), holder = %existing.user_id, "taking over stale lock");
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        // Non-blocking exclusive OS lock
        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;
        lock_file
            .sync_all()
            .map_err(|e| CalcError::file_error("sync lock", lock_path.display().to_string(), e.to_string()))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "lock acquired");
        Ok(FileLock {
            data_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        read_lock_info(&lock_path).ok().filter(|info| !is_lock_stale(info))
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
        tracing::debug!(path = %self.data_path.display(), "lock released");
    }
}

/// `shop.json` → `shop.json.lock`
fn lock_path_for(data_path: &Path) -> PathBuf {
    with_suffix(data_path, "lock")
}

/// `shop.json` → `shop.json.tmp`
fn tmp_path_for(data_path: &Path) -> PathBuf {
    with_suffix(data_path, "tmp")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut out = path.to_path_buf();
    let extension = out
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    out.set_extension(extension);
    out
}

fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    Ok(serde_json::from_str(&contents)?)
}

fn read_to_string(path: &Path, operation: &str) -> CalcResult<String> {
    let mut file =
        File::open(path).map_err(|e| CalcError::file_error(operation, path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::file_error(operation, path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

/// A lock is stale when its process is gone (same host) or it is too old.
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(windows)]
            {
                use std::process::Command;
                let output = Command::new("tasklist")
                    .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                    .output();
                if let Ok(output) = output {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                        return true;
                    }
                }
            }
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
        }
    }

    (Utc::now() - info.locked_at).num_hours() > STALE_LOCK_HOURS
}

/// Save shop data with atomic write semantics.
///
/// 1. Serialize to JSON
/// 2. Write to a temporary file (.tmp)
/// 3. Sync to disk (fsync)
/// 4. Rename over the target (atomic on most filesystems)
pub fn save_shop(shop: &ShopData, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(shop)?;
    let tmp_path = tmp_path_for(path);

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

    tracing::info!(
        path = %path.display(),
        records = shop.history.len(),
        machines = shop.machines.len(),
        "shop data saved"
    );
    Ok(())
}

/// Load shop data from a file.
///
/// # Returns
///
/// * `Err(CalcError::VersionMismatch)` - File version is incompatible
/// * `Err(CalcError::SerializationError)` - Invalid JSON
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_shop(path: &Path) -> CalcResult<ShopData> {
    let contents = read_to_string(path, "open")?;
    let shop: ShopData = serde_json::from_str(&contents)
        .map_err(|e| CalcError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?;
    validate_version(&shop.meta.version)?;
    tracing::info!(path = %path.display(), records = shop.history.len(), "shop data loaded");
    Ok(shop)
}

/// Load shop data if the file exists, otherwise start a new shop.
pub fn load_or_create(path: &Path, shop_name: &str, admin_user: &str) -> CalcResult<ShopData> {
    if path.exists() {
        load_shop(path)
    } else {
        tracing::info!(path = %path.display(), "no data file yet, starting a new shop");
        Ok(ShopData::new(shop_name, admin_user))
    }
}

/// Load shop data, also reporting whether someone else holds the lock.
pub fn load_shop_with_lock_check(path: &Path) -> CalcResult<(ShopData, Option<LockInfo>)> {
    let shop = load_shop(path)?;
    let lock_info = FileLock::check(path);
    Ok((shop, lock_info))
}

/// The major version must match; on 0.x a newer minor is rejected.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let file = Version::parse(file_version).map_err(|_| mismatch())?;
    let current = Version::parse(SCHEMA_VERSION).map_err(|_| mismatch())?;

    if file.major != current.major {
        return Err(mismatch());
    }
    if current.major == 0 && file.minor > current.minor {
        return Err(mismatch());
    }
    Ok(())
}
