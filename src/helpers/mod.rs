/// Helpers shared by the playback core and the remote sources
pub mod http_client;
pub mod retry;
pub mod source_validator;

pub use source_validator::{map_error_message, normalize_source, path_to_file_url, validate_source, NormalizedSource, SourceKind};
