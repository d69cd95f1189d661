//! Flat object storage for downloaded list files.
//!
//! The pipeline only needs put/get/exists over whole objects, keyed by
//! `{prefix}-{list_id}.csv`. The filesystem implementation creates its
//! bucket directory on first use.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

/// Object key for a stored list CSV.
pub fn list_object_key(prefix: &str, list_id: &str) -> String {
    format!("{prefix}-{list_id}.csv")
}

/// Minimal object-store contract used by the ingestion pipeline.
pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, content: &[u8]) -> io::Result<()>;

    /// Buffered reader over one object, for line-by-line streaming.
    fn get(&self, key: &str) -> io::Result<Box<dyn BufRead + Send>>;

    fn exists(&self, key: &str) -> io::Result<bool>;

    /// Size in bytes of a stored object.
    fn len(&self, key: &str) -> io::Result<u64>;
}

/// Filesystem-backed object store.
pub struct FsObjectStore {
    bucket_dir: PathBuf,
}

impl FsObjectStore {
    /// Open the store, creating the bucket directory if needed.
    pub fn new(bucket_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let bucket_dir = bucket_dir.into();
        std::fs::create_dir_all(&bucket_dir)?;
        Ok(Self { bucket_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.bucket_dir.join(key)
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, content: &[u8]) -> io::Result<()> {
        std::fs::write(self.path_for(key), content)?;
        tracing::debug!(key, bytes = content.len(), "stored object");
        Ok(())
    }

    fn get(&self, key: &str) -> io::Result<Box<dyn BufRead + Send>> {
        let file = File::open(self.path_for(key))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn exists(&self, key: &str) -> io::Result<bool> {
        self.path_for(key).try_exists()
    }

    fn len(&self, key: &str) -> io::Result<u64> {
        Ok(std::fs::metadata(self.path_for(key))?.len())
    }
}
