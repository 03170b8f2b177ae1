use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use thiserror::Error;
use walkdir::WalkDir;

/// Extension used when the caller does not pass one
pub const DEFAULT_EXTENSION: &str = ".mp4";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source file does not exist: {0}")]
    MissingSource(String),
}

/// A directory of files addressed by arbitrary keys (usually URLs)
///
/// Keys are hashed so any string maps to a stable, file-system safe name.
#[derive(Debug, Clone)]
pub struct FileCache {
    base_path: PathBuf,
}

/// Hash a key into the file stem used on disk
pub fn cache_key(key: &str) -> String {
    format!("{:x}", md5::compute(key.trim().as_bytes()))
}

/// Make sure an extension has a leading dot; empty becomes ".bin"
pub fn normalize_extension(extension: &str) -> String {
    let extension = extension.trim();
    if extension.is_empty() {
        ".bin".to_string()
    } else if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}

impl FileCache {
    /// Create a cache in `dir`, creating the directory if needed
    pub fn with_directory<P: AsRef<Path>>(dir: P) -> Self {
        let base_path = dir.as_ref().to_path_buf();

        if let Err(e) = fs::create_dir_all(&base_path) {
            error!("Failed to create file cache directory at {:?}: {}", base_path, e);
        } else {
            debug!("File cache at {:?}", base_path);
        }

        FileCache { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path a key maps to, whether or not the file exists
    pub fn path(&self, key: &str, extension: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", cache_key(key), normalize_extension(extension)))
    }

    pub fn exists(&self, key: &str, extension: &str) -> bool {
        self.path(key, extension).is_file()
    }

    /// Copy `source` into the cache under `key`, replacing an existing entry
    pub fn store<P: AsRef<Path>>(&self, key: &str, source: P, extension: &str) -> Result<PathBuf, CacheError> {
        let source = source.as_ref();
        if !source.is_file() {
            return Err(CacheError::MissingSource(source.display().to_string()));
        }

        let target = self.path(key, extension);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &target)?;

        debug!("Cached {} as {}", source.display(), target.display());
        Ok(target)
    }

    /// Remove the entry for `key`; a missing entry is not an error
    pub fn evict(&self, key: &str, extension: &str) -> Result<(), CacheError> {
        let target = self.path(key, extension);
        if target.exists() {
            fs::remove_file(&target)?;
            debug!("Evicted {}", target.display());
        }
        Ok(())
    }

    pub fn total_size_bytes(&self) -> u64 {
        WalkDir::new(&self.base_path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|meta| meta.len())
            .sum()
    }

    /// Delete every cached file, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        for entry in WalkDir::new(&self.base_path).into_iter().filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove cached file {}: {}", entry.path().display(), e),
            }
        }
        info!("Cleared {} file(s) from cache {:?}", removed, self.base_path);
        removed
    }
}
