//! Custom actix-web middleware.

mod access_log;

pub use access_log::AccessLog;
