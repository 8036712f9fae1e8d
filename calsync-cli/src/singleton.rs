//! One writer per calendar directory.
//!
//! The lock lives in the runtime dir, named after the calendar directory it
//! guards, so two configs pointing at different trees can sync side by side.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Holds the lock until dropped.
pub struct LockGuard {
    _file: File,
}

fn lock_dir() -> Result<PathBuf> {
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not determine runtime directory"))?;

    Ok(runtime_dir.join("calsync"))
}

/// `sync-<dir>.lock`, with the absolute calendar path flattened into the name.
fn lock_file_name(calendar_dir: &Path) -> String {
    let absolute = fs::canonicalize(calendar_dir).unwrap_or_else(|_| calendar_dir.to_path_buf());
    let flat: String = absolute
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    format!("sync-{}.lock", flat.trim_matches('-'))
}

/// Acquire the sync lock for `calendar_dir`, failing if another process holds it.
pub fn acquire_lock(calendar_dir: &Path) -> Result<LockGuard> {
    acquire_lock_in(&lock_dir()?, calendar_dir)
}

fn acquire_lock_in(lock_dir: &Path, calendar_dir: &Path) -> Result<LockGuard> {
    fs::create_dir_all(lock_dir)?;
    let path = lock_dir.join(lock_file_name(calendar_dir));

    // Not truncated on open: the current holder's pid must survive a failed attempt
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .context("Failed to create lock file")?;

    if file.try_lock_exclusive().is_err() {
        let mut holder = String::new();
        let _ = file.read_to_string(&mut holder);
        let holder = match holder.trim() {
            "" => String::new(),
            pid => format!(" (pid {})", pid),
        };
        anyhow::bail!(
            "Another calsync sync or watch is already running on {}{}.\n\
            If you believe this is an error, remove: {}",
            calendar_dir.display(),
            holder,
            path.display()
        );
    }

    file.set_len(0)?;
    file.rewind()?;
    write!(file, "{}", std::process::id())?;
    file.flush()?;

    Ok(LockGuard { _file: file })
}
