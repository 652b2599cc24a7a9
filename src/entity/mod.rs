//! SeaORM entities.

pub mod api_key;
pub mod invoice;
pub mod job;
pub mod report;
pub mod report_photo;
pub mod user;
