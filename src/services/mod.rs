//! Business services: key management, document numbering, photo storage.

pub mod api_key;
pub mod numbering;
pub mod storage;

pub use storage::Storage;
