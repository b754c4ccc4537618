//! Workspace scanning
//!
//! Each input directory may hold one module manifest. Directories are
//! examined in parallel with `rayon`; the results come back in input order so
//! the registry can fold them deterministically.
//!
//! - No manifest in a directory: the directory contributes nothing.
//! - A manifest that fails to decode or validate: a `ConfigError`, reported
//!   alongside the other results and never stopping sibling directories.
//! - A directory that cannot be listed: an I/O error for the whole scan.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use rayon::prelude::*;

use crate::config::{self, is_manifest_name, LoadedManifest};
use crate::error::{ConfigError, Error, Result};
use crate::filesystem::SchemaSource;

/// What one directory produced.
#[derive(Debug)]
pub enum ScanOutcome {
    /// No manifest present.
    Empty,
    /// A manifest was found and accepted.
    Loaded(LoadedManifest),
    /// A manifest was found but rejected.
    Rejected(ConfigError),
}

/// Locate the manifest file inside `dir`.
///
/// When several names match, the lexicographically first wins and a warning
/// is logged.
pub fn find_manifest(source: &dyn SchemaSource, dir: &Path) -> Result<Option<PathBuf>> {
    let names = source.read_dir_names(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut matches: Vec<&String> = names.iter().filter(|n| is_manifest_name(n)).collect();
    matches.sort();

    if matches.len() > 1 {
        warn!(
            "Multiple manifests in {}: {:?}; using {}",
            dir.display(),
            matches,
            matches[0]
        );
    }
    Ok(matches.first().map(|name| dir.join(name)))
}

/// Examine a single directory.
pub fn scan_directory(source: &dyn SchemaSource, dir: &Path) -> Result<ScanOutcome> {
    let dir = absolute(dir)?;
    let Some(manifest) = find_manifest(source, &dir)? else {
        debug!("No manifest in {}", dir.display());
        return Ok(ScanOutcome::Empty);
    };

    Ok(match config::load(source, &manifest) {
        Ok(loaded) => ScanOutcome::Loaded(loaded),
        Err(error) => {
            warn!("Rejected manifest {}: {}", manifest.display(), error);
            ScanOutcome::Rejected(error)
        }
    })
}

/// Examine every directory in parallel, returning outcomes in input order.
pub fn scan_directories<P>(source: &dyn SchemaSource, dirs: &[P]) -> Result<Vec<ScanOutcome>>
where
    P: AsRef<Path> + Sync,
{
    dirs.par_iter()
        .map(|dir| scan_directory(source, dir.as_ref()))
        .collect()
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    std::path::absolute(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFS;

    const SDK: &str = "name: sdk\nresources:\n  - name: common\n    version: 1\n    http: [common.yaml]\n";

    #[test]
    fn test_find_manifest_variants() {
        let fs = MemoryFS::new();
        fs.add_file_string("/ws/a/JsmnForge.yml", SDK);
        fs.add_file_string("/ws/a/common.yaml", "");

        assert_eq!(
            find_manifest(&fs, Path::new("/ws/a")).unwrap(),
            Some(PathBuf::from("/ws/a/JsmnForge.yml"))
        );
        assert_eq!(find_manifest(&fs, Path::new("/ws/empty")).unwrap(), None);
    }

    #[test]
    fn test_find_manifest_prefers_first_sorted() {
        let fs = MemoryFS::new();
        fs.add_file_string("/ws/a/jsmn-forge.yaml", SDK);
        fs.add_file_string("/ws/a/.jsmn-forge.yaml", SDK);

        assert_eq!(
            find_manifest(&fs, Path::new("/ws/a")).unwrap(),
            Some(PathBuf::from("/ws/a/.jsmn-forge.yaml"))
        );
    }

    #[test]
    fn test_scan_directories_keeps_input_order() {
        let fs = MemoryFS::new();
        fs.add_file_string("/ws/sdk/.jsmn-forge.yaml", SDK);
        fs.add_file_string("/ws/bad/.jsmn-forge.yaml", "name: [oops");

        let outcomes =
            scan_directories(&fs, &["/ws/bad", "/ws/none", "/ws/sdk"]).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            outcomes[0],
            ScanOutcome::Rejected(ConfigError::Decode { .. })
        ));
        assert!(matches!(outcomes[1], ScanOutcome::Empty));
        match &outcomes[2] {
            ScanOutcome::Loaded(loaded) => assert_eq!(loaded.manifest.name, "sdk"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_unlistable_directory_is_io_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let err = scan_directory(&crate::filesystem::DiskFS, &missing).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
