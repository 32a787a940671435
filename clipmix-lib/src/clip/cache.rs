//! In-memory cache of decoded clips keyed by file path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};

use crate::error::DecodeError;
use crate::sync::lock;

use super::loader::{ClipData, ClipLoader};

/// Decoded clips shared between triggers.
///
/// The map lock is only held for lookups and inserts; decoding always runs
/// with the lock released so concurrent triggers of other clips never wait
/// on disk I/O.
#[derive(Debug)]
pub struct ClipCache {
    loader: ClipLoader,
    clips: Mutex<HashMap<PathBuf, ClipData>>,
}

impl ClipCache {
    pub fn new(loader: ClipLoader) -> Self {
        Self {
            loader,
            clips: Mutex::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &ClipLoader {
        &self.loader
    }

    /// Return the cached clip for `path`, loading it on a miss.
    pub fn get_or_load(&self, path: &Path) -> Result<ClipData, DecodeError> {
        if let Some(clip) = self.get(path) {
            return Ok(clip);
        }

        let clip = self.loader.load(path)?;
        let mut clips = lock(&self.clips);
        // Another thread may have loaded the same path meanwhile; keep the first.
        let entry = clips.entry(path.to_path_buf()).or_insert(clip);
        Ok(entry.clone())
    }

    /// Cached clip for `path`, if any.
    pub fn get(&self, path: &Path) -> Option<ClipData> {
        lock(&self.clips).get(path).cloned()
    }

    /// Load every path into the cache. Failures are logged and skipped.
    ///
    /// Returns the number of clips available afterwards from `paths`.
    pub fn preload<P: AsRef<Path>>(&self, paths: &[P]) -> usize {
        let mut loaded = 0;
        for path in paths {
            let path = path.as_ref();
            match self.get_or_load(path) {
                Ok(_) => loaded += 1,
                Err(err) => warn!("failed to preload {}: {}", path.display(), err),
            }
        }
        debug!("preloaded {}/{} clips", loaded, paths.len());
        loaded
    }

    pub fn contains(&self, path: &Path) -> bool {
        lock(&self.clips).contains_key(path)
    }

    /// Duration in seconds of a cached clip.
    pub fn duration(&self, path: &Path) -> Option<f64> {
        lock(&self.clips).get(path).map(ClipData::duration_secs)
    }

    pub fn remove(&self, path: &Path) -> bool {
        lock(&self.clips).remove(path).is_some()
    }

    pub fn clear(&self) {
        lock(&self.clips).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.clips).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
