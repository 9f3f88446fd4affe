//! Batch source for flow log directories
//!
//! Discovers batch files under an input directory, fixes their consumption
//! order, and serves raw bytes per batch. Offsets are assigned once at
//! discovery time from the lexicographic listing order, so the full batch
//! list and total count are known upfront.

use crate::app::models::BatchHandle;
use crate::{Error, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task;
use tracing::debug;

/// Ordered source of flow batch files
#[derive(Debug)]
pub struct BatchSource {
    root: PathBuf,
    pattern: Pattern,
    recursive: bool,
    batches: Vec<BatchHandle>,
}

impl BatchSource {
    /// Create a new source over a directory.
    ///
    /// `pattern` is matched against file names (not full paths).
    pub fn new(root: impl Into<PathBuf>, pattern: &str, recursive: bool) -> Result<Self> {
        let pattern = Pattern::new(pattern)
            .map_err(|e| Error::configuration(format!("invalid batch file pattern: {}", e)))?;

        Ok(Self {
            root: root.into(),
            pattern,
            recursive,
            batches: Vec::new(),
        })
    }

    /// Discover all batch files and assign offsets `0..N-1`.
    ///
    /// Returns the total batch count N.
    pub async fn discover(&mut self) -> Result<usize> {
        if !self.root.is_dir() {
            return Err(Error::configuration(format!(
                "input path is not a directory: {}",
                self.root.display()
            )));
        }

        debug!("Discovering batch files in: {}", self.root.display());

        let mut paths = if self.recursive {
            self.walk_recursive().await?
        } else {
            self.list_flat().await?
        };

        // Lexicographic order fixes the offset assignment
        paths.sort();

        self.batches = paths
            .into_iter()
            .enumerate()
            .map(|(offset, path)| BatchHandle::new(offset as u64, path))
            .collect();

        debug!(
            "Discovered {} batch files in {}",
            self.batches.len(),
            self.root.display()
        );

        Ok(self.batches.len())
    }

    /// All currently known batches, in consumption order
    pub fn list_batches(&self) -> &[BatchHandle] {
        &self.batches
    }

    /// Total number of batches enumerated at discovery
    pub fn total_batches(&self) -> usize {
        self.batches.len()
    }

    /// The next batch strictly after the given cursor, or `None`
    pub fn next_unconsumed(&self, cursor: Option<u64>) -> Option<&BatchHandle> {
        let next = match cursor {
            Some(offset) => offset + 1,
            None => 0,
        };
        self.batches.get(next as usize)
    }

    /// Whether every known batch lies at or before the cursor
    pub fn is_exhausted(&self, cursor: Option<u64>) -> bool {
        self.next_unconsumed(cursor).is_none()
    }

    /// Read the raw bytes of one batch.
    ///
    /// I/O failures surface as [`Error::BatchUnavailable`] so the driver can
    /// apply its bounded retry policy.
    pub async fn read_batch(&self, handle: &BatchHandle) -> Result<Vec<u8>> {
        fs::read(&handle.path)
            .await
            .map_err(|e| Error::batch_unavailable(handle.offset, handle.path.clone(), e))
    }

    async fn list_flat(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && self.matches(&path) {
                paths.push(path);
            }
        }

        Ok(paths)
    }

    async fn walk_recursive(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let pattern = self.pattern.clone();

        task::spawn_blocking(move || -> Result<Vec<PathBuf>> {
            let mut paths = Vec::new();
            for entry in walkdir::WalkDir::new(&root).follow_links(false) {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type().is_file() && matches_pattern(&pattern, path) {
                    paths.push(path.to_path_buf());
                }
            }
            Ok(paths)
        })
        .await
        .map_err(|e| Error::configuration(format!("batch discovery task failed: {}", e)))?
    }

    fn matches(&self, path: &Path) -> bool {
        matches_pattern(&self.pattern, path)
    }
}

fn matches_pattern(pattern: &Pattern, path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| pattern.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn create_test_batches(dir: &TempDir, names: &[&str]) {
        for name in names {
            std_fs::write(dir.path().join(name), "{}\n").unwrap();
        }
    }

    #[tokio::test]
    async fn test_discovery_orders_lexicographically() {
        let temp_dir = TempDir::new().unwrap();
        create_test_batches(
            &temp_dir,
            &["flows_10.json", "flows_02.json", "flows_01.json", "notes.txt"],
        );

        let mut source = BatchSource::new(temp_dir.path(), "*.json", false).unwrap();
        let total = source.discover().await.unwrap();

        assert_eq!(total, 3);
        let names: Vec<_> = source
            .list_batches()
            .iter()
            .map(|b| b.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["flows_01.json", "flows_02.json", "flows_10.json"]);
        assert_eq!(source.list_batches()[0].offset, 0);
        assert_eq!(source.list_batches()[2].offset, 2);
    }

    #[tokio::test]
    async fn test_cursor_walkthrough() {
        let temp_dir = TempDir::new().unwrap();
        create_test_batches(&temp_dir, &["a.json", "b.json"]);

        let mut source = BatchSource::new(temp_dir.path(), "*.json", false).unwrap();
        source.discover().await.unwrap();

        let first = source.next_unconsumed(None).unwrap();
        assert_eq!(first.offset, 0);

        let second = source.next_unconsumed(Some(0)).unwrap();
        assert_eq!(second.offset, 1);

        assert!(source.next_unconsumed(Some(1)).is_none());
        assert!(source.is_exhausted(Some(1)));
        assert!(!source.is_exhausted(None));
    }

    #[tokio::test]
    async fn test_empty_directory_is_exhausted_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = BatchSource::new(temp_dir.path(), "*.json", false).unwrap();

        assert_eq!(source.discover().await.unwrap(), 0);
        assert!(source.is_exhausted(None));
    }

    #[tokio::test]
    async fn test_missing_directory_is_rejected() {
        let mut source = BatchSource::new("/nonexistent/flow/dir", "*.json", false).unwrap();
        assert!(source.discover().await.is_err());
    }

    #[tokio::test]
    async fn test_read_missing_batch_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        create_test_batches(&temp_dir, &["a.json"]);

        let mut source = BatchSource::new(temp_dir.path(), "*.json", false).unwrap();
        source.discover().await.unwrap();

        let handle = source.list_batches()[0].clone();
        std_fs::remove_file(&handle.path).unwrap();

        let result = source.read_batch(&handle).await;
        match result {
            Err(Error::BatchUnavailable { offset, .. }) => assert_eq!(offset, 0),
            other => panic!("expected BatchUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_recursive_discovery() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("day_01");
        std_fs::create_dir_all(&nested).unwrap();
        std_fs::write(nested.join("b.json"), "{}\n").unwrap();
        std_fs::write(temp_dir.path().join("a.json"), "{}\n").unwrap();

        let mut flat = BatchSource::new(temp_dir.path(), "*.json", false).unwrap();
        assert_eq!(flat.discover().await.unwrap(), 1);

        let mut recursive = BatchSource::new(temp_dir.path(), "*.json", true).unwrap();
        assert_eq!(recursive.discover().await.unwrap(), 2);
    }
}
