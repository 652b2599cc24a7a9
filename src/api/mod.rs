//! API endpoint modules.

pub mod auth_admin;
pub mod health;
pub mod invoices;
pub mod jobs;
pub mod openapi;
pub mod reports;

pub use auth_admin::configure_routes as configure_auth_routes;
pub use health::configure_health_routes;
pub use invoices::configure_routes as configure_invoice_routes;
pub use jobs::configure_routes as configure_job_routes;
pub use openapi::ApiDoc;
pub use reports::configure_routes as configure_report_routes;
