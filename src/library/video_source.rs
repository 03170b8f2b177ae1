use std::fs;
use std::path::Path;

use log::{debug, error};

use crate::data::VideoFile;
use crate::library::local_catalog::LocalMediaCatalog;
use crate::webdav::RemoteFileClient;

/// A place videos can be listed from and copied out of
pub trait VideoSource {
    /// Human readable name, e.g. for a source picker
    fn source_name(&self) -> &str;

    /// List the videos available under `path`; empty means the source default
    fn list(&mut self, path: &str) -> Vec<VideoFile>;

    /// Copy `file` to `local_path`, reporting progress in percent
    fn download(&mut self, file: &VideoFile, local_path: &str, on_progress: Option<&mut dyn FnMut(f32)>) -> bool;
}

/// Videos from the local media directory
pub struct LocalVideoSource {
    catalog: LocalMediaCatalog,
}

impl LocalVideoSource {
    pub fn new(catalog: LocalMediaCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&mut self) -> &mut LocalMediaCatalog {
        &mut self.catalog
    }
}

impl VideoSource for LocalVideoSource {
    fn source_name(&self) -> &str {
        "Local"
    }

    fn list(&mut self, _path: &str) -> Vec<VideoFile> {
        self.catalog.videos()
    }

    fn download(&mut self, file: &VideoFile, local_path: &str, on_progress: Option<&mut dyn FnMut(f32)>) -> bool {
        if local_path.trim().is_empty() {
            return false;
        }

        let source = if file.local_path.trim().is_empty() { &file.path } else { &file.local_path };
        let source = Path::new(source);
        if !source.is_file() {
            debug!("Local source {} does not exist", source.display());
            return false;
        }

        let target = Path::new(local_path);
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!("Failed to create {}: {}", parent.display(), e);
                    return false;
                }
            }
        }

        match fs::copy(source, target) {
            Ok(_) => {
                if let Some(callback) = on_progress {
                    callback(100.0);
                }
                true
            }
            Err(e) => {
                error!("Failed to copy {} to {}: {}", source.display(), local_path, e);
                false
            }
        }
    }
}

/// Videos on a WebDAV server
pub struct WebDavVideoSource {
    client: RemoteFileClient,
}

impl WebDavVideoSource {
    pub fn new(client: RemoteFileClient) -> Self {
        Self { client }
    }

    pub fn client(&mut self) -> &mut RemoteFileClient {
        &mut self.client
    }
}

impl VideoSource for WebDavVideoSource {
    fn source_name(&self) -> &str {
        "WebDAV"
    }

    fn list(&mut self, path: &str) -> Vec<VideoFile> {
        self.client
            .list_files(path)
            .into_iter()
            .map(VideoFile::from)
            .collect()
    }

    fn download(&mut self, file: &VideoFile, local_path: &str, on_progress: Option<&mut dyn FnMut(f32)>) -> bool {
        let remote_path = if file.path.trim().is_empty() { &file.url } else { &file.path };
        if remote_path.trim().is_empty() || local_path.trim().is_empty() {
            return false;
        }
        self.client.download_file(remote_path, local_path, on_progress)
    }
}
