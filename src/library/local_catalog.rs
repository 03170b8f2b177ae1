use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::data::{extension_of, is_360_name, is_supported_extension, VideoFile};
use crate::helpers::path_to_file_url;

/// Videos stored below a local directory
pub struct LocalMediaCatalog {
    root: PathBuf,
    videos: Vec<VideoFile>,
}

fn video_from_path(path: &Path, size: u64) -> VideoFile {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let path = path.to_string_lossy().to_string();

    VideoFile {
        is_360: is_360_name(&name),
        name,
        url: path_to_file_url(&path),
        local_path: path.clone(),
        path,
        size,
    }
}

impl LocalMediaCatalog {
    /// Create a catalog rooted at `root`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        if let Err(e) = fs::create_dir_all(&root) {
            error!("Failed to create media directory at {:?}: {}", root, e);
        } else {
            debug!("Media directory: {:?}", root);
        }

        LocalMediaCatalog {
            root,
            videos: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rescan the directory tree
    ///
    /// Entries that cannot be read are skipped.
    pub fn refresh(&mut self) {
        self.videos.clear();

        if !self.root.is_dir() {
            return;
        }

        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read media directory entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let supported = extension_of(&entry.file_name().to_string_lossy())
                .map(|ext| is_supported_extension(&ext))
                .unwrap_or(false);
            if !supported {
                continue;
            }

            let size = entry.metadata().map(|meta| meta.len()).unwrap_or(0);
            self.videos.push(video_from_path(entry.path(), size));
        }

        self.videos.sort_by(|a, b| a.path.cmp(&b.path));
        info!("Found {} local video(s) in {:?}", self.videos.len(), self.root);
    }

    /// Rescan and return the current list
    pub fn videos(&mut self) -> Vec<VideoFile> {
        self.refresh();
        self.videos.clone()
    }

    /// Add a file that lives outside the media directory
    pub fn add_video<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        let metadata = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                error!("File does not exist: {}", path.display());
                return false;
            }
        };

        let local_path = path.to_string_lossy();
        if self.videos.iter().any(|video| video.local_path == local_path) {
            debug!("{} is already in the catalog", local_path);
            return false;
        }

        let video = video_from_path(path, metadata.len());
        info!("Added local video: {}", video.name);
        self.videos.push(video);
        true
    }

    /// Delete a video file from disk and from the list
    pub fn delete_video<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        if !path.is_file() {
            return false;
        }

        if let Err(e) = fs::remove_file(path) {
            error!("Failed to delete {}: {}", path.display(), e);
            return false;
        }

        let local_path = path.to_string_lossy();
        self.videos.retain(|video| video.local_path != local_path);
        info!("Deleted video: {}", local_path);
        true
    }

    /// Remove everything below the root and recreate the empty directory
    pub fn clear(&mut self) -> bool {
        self.videos.clear();
        if !self.root.exists() {
            return true;
        }

        let result = fs::remove_dir_all(&self.root).and_then(|_| fs::create_dir_all(&self.root));
        match result {
            Ok(()) => {
                info!("Cleared media directory {:?}", self.root);
                true
            }
            Err(e) => {
                error!("Failed to clear media directory {:?}: {}", self.root, e);
                false
            }
        }
    }

    /// Size of all files below the root, including non-video files
    pub fn total_size_bytes(&self) -> u64 {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|meta| meta.len())
            .sum()
    }
}
