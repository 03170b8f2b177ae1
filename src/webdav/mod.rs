// WebDAV access to remote video folders

pub mod client;
pub mod multistatus;

pub use client::{combine_url, normalize_server_url, RemoteFileClient, RemoteFileEntry};
pub use multistatus::{parse_multistatus, MultiStatusEntry, MultiStatusError};
