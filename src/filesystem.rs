//! File access behind a trait, so the registry can run against disk or memory

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Read-only access to manifests and schema files.
///
/// Implementations must be shareable across rayon worker threads.
pub trait SchemaSource: Send + Sync + std::fmt::Debug {
    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// List the file names (not paths) directly inside `dir`.
    fn read_dir_names(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFS;

impl SchemaSource for DiskFS {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_dir_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.path().is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }
}

/// In-memory filesystem that records how often each file was read.
#[derive(Debug, Clone, Default)]
pub struct MemoryFS {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    reads: Arc<Mutex<HashMap<PathBuf, usize>>>,
    total_reads: Arc<AtomicUsize>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&self, path: P, content: &str) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.as_ref().to_path_buf(), content.to_string());
        }
    }

    /// Check if a file exists
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path.as_ref()))
            .unwrap_or(false)
    }

    /// Number of successful and failed reads of `path` so far
    pub fn read_count<P: AsRef<Path>>(&self, path: P) -> usize {
        self.reads
            .lock()
            .map(|reads| reads.get(path.as_ref()).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of file reads across all paths
    pub fn total_reads(&self) -> usize {
        self.total_reads.load(Ordering::SeqCst)
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "memory filesystem lock poisoned")
}

impl SchemaSource for MemoryFS {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.total_reads.fetch_add(1, Ordering::SeqCst);
        {
            let mut reads = self.reads.lock().map_err(|_| poisoned())?;
            *reads.entry(path.to_path_buf()).or_insert(0) += 1;
        }
        let files = self.files.lock().map_err(|_| poisoned())?;
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn read_dir_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        let files = self.files.lock().map_err(|_| poisoned())?;
        let mut names: Vec<String> = files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }
}
