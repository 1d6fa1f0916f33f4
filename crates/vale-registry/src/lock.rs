//! Advisory lock against a second writer process.
//!
//! The registry assumes a single writer. The desktop application can still
//! be launched twice by accident, so the registry holds an exclusive `fs2`
//! lock on `<index>.lock` for as long as it is open. The lock is released
//! on drop.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// An exclusive lock on a registry directory.
#[derive(Debug)]
pub struct ProcessLock {
    file: File,
    path: PathBuf,
}

impl ProcessLock {
    /// Acquire the lock at `path` without blocking.
    ///
    /// Fails with [`RegistryError::Locked`] if another process holds it.
    pub fn acquire(path: &Path) -> RegistryResult<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        if let Err(e) = file.try_lock_exclusive() {
            if is_contended(&e) {
                return Err(RegistryError::Locked(path.to_path_buf()));
            }
            return Err(RegistryError::Io(e));
        }

        // Record our PID for whoever finds the lock file later.
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        debug!(path = %path.display(), "registry lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

}

/// Held by someone else, as opposed to locking being unsupported here.
fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "registry lock released");
    }
}
