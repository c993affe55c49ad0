//! # Persisted Cache Store
//!
//! Stores the last known-good field mapping per category as a small JSON
//! file, so a run with dead providers can still show something. The store
//! is deliberately forgiving: a missing or corrupt cache loads as an empty
//! snapshot, and a failed write is the caller's problem to log, never to
//! abort over. A dashboard that can't persist its cache should still
//! render with what it has.

use crate::FieldMap;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Last known-good values keyed by category name.
///
/// String keys (rather than [`crate::Category`]) so that a hand-edited or
/// older cache file with unknown categories still deserializes.
pub type Snapshot = HashMap<String, FieldMap>;

/// Load the snapshot from `path`.
///
/// Returns an empty snapshot, not an error, when the file is missing or
/// unparsable; corrupt cache must never abort a run.
pub fn load<P: AsRef<Path>>(path: P) -> Snapshot {
    let path = path.as_ref();
    match fs::read(path) {
        Ok(data) => match serde_json::from_slice(&data) {
            Ok(snapshot) => {
                log::debug!("cache loaded from {}", path.display());
                snapshot
            }
            Err(e) => {
                log::warn!("discarding corrupt cache {}: {}", path.display(), e);
                Snapshot::new()
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("no cache file at {}", path.display());
            Snapshot::new()
        }
        Err(e) => {
            log::warn!("failed to read cache {}: {}", path.display(), e);
            Snapshot::new()
        }
    }
}

/// Save the snapshot to `path`. Write failures are returned for the caller
/// to log; they are never fatal.
pub fn save<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> io::Result<()> {
    let data = serde_json::to_vec_pretty(snapshot)?;
    fs::write(&path, data)?;
    log::debug!("cache saved to {}", path.as_ref().display());
    Ok(())
}
