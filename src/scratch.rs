//! Operation-scoped resources: a private scratch directory and a cancellation
//! checkpoint (spec §5). No state here is shared across operations, and
//! nothing in this module spawns a background thread of its own.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::error::{EftError, EftResult};

/// A scratch directory exclusively owned by one encode/decode operation.
/// Removed on every exit path, including unwinding panics, via `Drop`.
pub struct ScratchDir {
    dir: tempfile::TempDir,
}

impl ScratchDir {
    /// Allocates a fresh scratch directory under the system temp root.
    pub fn new_for_operation() -> EftResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("eft-codec-")
            .tempdir()
            .map_err(EftError::from)?;
        Ok(ScratchDir { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Deletes scratch roots under `parent` whose directory name starts with
/// `eft-codec-` and whose modified time is older than `max_age`. Intended to
/// be invoked on a schedule by the host process; this crate never spawns its
/// own background thread.
pub fn sweep_stale_scratch_dirs(parent: &Path, max_age: Duration) -> EftResult<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    let entries = match std::fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(EftError::from(err)),
    };
    for entry in entries {
        let entry = entry.map_err(EftError::from)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with("eft-codec-") {
            continue;
        }
        let metadata = entry.metadata().map_err(EftError::from)?;
        if !metadata.is_dir() {
            continue;
        }
        let age = match metadata.modified().ok().and_then(|m| now.duration_since(m).ok()) {
            Some(age) => age,
            None => continue,
        };
        if age > max_age {
            if std::fs::remove_dir_all(entry.path()).is_ok() {
                removed += 1;
            }
        }
    }
    if removed > 0 {
        tracing::info!(removed, "swept stale scratch directories");
    }
    Ok(removed)
}

/// Default staleness threshold used by the host's scheduled sweep (spec §5).
pub const DEFAULT_STALE_AGE: Duration = Duration::from_secs(60 * 60);

/// A cooperative cancellation flag checked between records on both the
/// encode and decode sides.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(Cancelled)` if cancellation was requested, else `Ok(())`.
    /// Call between records during encode/decode.
    pub fn check(&self) -> EftResult<()> {
        if self.is_cancelled() {
            Err(EftError::Cancelled)
        } else {
            Ok(())
        }
    }
}
