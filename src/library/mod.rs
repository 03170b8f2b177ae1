// Local media storage and the sources videos come from

pub mod file_cache;
pub mod local_catalog;
pub mod video_source;

pub use file_cache::{CacheError, FileCache};
pub use local_catalog::LocalMediaCatalog;
pub use video_source::{LocalVideoSource, VideoSource, WebDavVideoSource};
