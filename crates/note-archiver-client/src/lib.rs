pub mod archive_client;

pub use archive_client::{ReqwestArchiveClient, classify_error};
