//! Write serialization.
//!
//! A candidate lives in two stores. Writers take the candidate's lock for the
//! whole structured-then-vector sequence so two upserts of the same id never
//! interleave across stores. Different ids proceed in parallel.
//!
//! Across processes, mutating commands hold [`GlobalLock`] on the data root.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Default)]
pub struct CandidateLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CandidateLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `candidate_id`.
    pub fn with_lock<T>(&self, candidate_id: &str, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(candidate_id.to_string()).or_default())
        };
        let result = {
            let _guard = slot.lock();
            f()
        };

        let mut slots = self.slots.lock();
        // Map plus this call hold the only references: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(candidate_id);
        }
        result
    }

    /// Ids with a writer currently holding or waiting on the lock.
    #[must_use]
    pub fn active(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Exclusive advisory lock on the data root, released on drop.
#[derive(Debug)]
pub struct GlobalLock {
    lock_file: File,
    lock_path: PathBuf,
}

/// Written into the lock file so a blocked user can see who holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub hostname: String,
}

impl GlobalLock {
    const LOCK_FILENAME: &'static str = "hri.lock";
    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    fn open(root: &Path) -> io::Result<(File, PathBuf)> {
        fs::create_dir_all(root)?;
        let lock_path = root.join(Self::LOCK_FILENAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        Ok((file, lock_path))
    }

    fn claim(file: File, lock_path: PathBuf) -> io::Result<Self> {
        let info = LockInfo {
            pid: std::process::id(),
            acquired_at: Utc::now(),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string()),
        };
        file.set_len(0)?;
        let mut writer = &file;
        writer.write_all(serde_json::to_string(&info)?.as_bytes())?;
        debug!(path = %lock_path.display(), "acquired global lock");
        Ok(Self {
            lock_file: file,
            lock_path,
        })
    }

    /// Block until the lock is held.
    pub fn acquire(root: &Path) -> io::Result<Self> {
        let (file, lock_path) = Self::open(root)?;
        file.lock_exclusive()?;
        Self::claim(file, lock_path)
    }

    /// `None` when another process holds the lock.
    pub fn try_acquire(root: &Path) -> io::Result<Option<Self>> {
        let (file, lock_path) = Self::open(root)?;
        match file.try_lock_exclusive() {
            Ok(()) => Self::claim(file, lock_path).map(Some),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Poll until acquired or `timeout` passes.
    pub fn acquire_timeout(root: &Path, timeout: Duration) -> io::Result<Option<Self>> {
        let start = Instant::now();
        loop {
            if let Some(lock) = Self::try_acquire(root)? {
                return Ok(Some(lock));
            }
            if start.elapsed() >= timeout {
                return Ok(None);
            }
            std::thread::sleep(Self::POLL_INTERVAL);
        }
    }

    /// Holder of the lock at `root`, if the lock file names one.
    pub fn holder(root: &Path) -> Option<LockInfo> {
        let contents = fs::read_to_string(root.join(Self::LOCK_FILENAME)).ok()?;
        serde_json::from_str(&contents).ok()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for GlobalLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock_file);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn test_same_id_is_serialized() {
        let locks = Arc::new(CandidateLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    locks.with_lock("same", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn test_returns_closure_value() {
        let locks = CandidateLocks::new();
        assert_eq!(locks.with_lock("a", || 42), 42);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn test_global_lock_excludes_second_holder() {
        let dir = tempfile::tempdir().unwrap();
        let held = GlobalLock::acquire(dir.path()).unwrap();
        assert!(held.path().exists());
        assert!(GlobalLock::try_acquire(dir.path()).unwrap().is_none());
        let info = GlobalLock::holder(dir.path()).unwrap();
        assert_eq!(info.pid, std::process::id());
        drop(held);
        assert!(GlobalLock::try_acquire(dir.path()).unwrap().is_some());
    }

    #[test]
    fn test_acquire_timeout_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let _held = GlobalLock::acquire(dir.path()).unwrap();
        let waited = GlobalLock::acquire_timeout(dir.path(), Duration::from_millis(60)).unwrap();
        assert!(waited.is_none());
    }
}
