//! Domain models for the HVAC service desk.

pub mod actor;
pub mod api_key;
pub mod invoice;
pub mod job;
pub mod report;

// Re-export commonly used types
pub use actor::{ActorContext, Role};
pub use api_key::{ApiKey, ApiKeyCreateResponse, ApiKeyListItem, CreateApiKeyRequest};
pub use invoice::{
    CreateInvoiceRequest, InvoiceListResponse, InvoiceResponse, InvoiceStatus, ListInvoicesQuery,
    PatchInvoiceRequest, ReportPaymentRequest,
};
pub use job::{
    AssignTechnicianRequest, CreateJobRequest, JobListResponse, JobResponse, JobSortField,
    JobStatus, ListJobsQuery, UpdateJobRequest,
};
pub use report::{PhotoResponse, ReportListResponse, ReportResponse, UpdateDescriptionRequest};

/// Maximum page size accepted by list endpoints.
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Normalize (page, limit) query values: page is 1-based, limit clamped to
/// 1..=MAX_PAGE_LIMIT.
pub fn normalize_page(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_page_defaults() {
        assert_eq!(normalize_page(None, None), (1, DEFAULT_PAGE_LIMIT));
        assert_eq!(normalize_page(Some(0), Some(0)), (1, 1));
        assert_eq!(normalize_page(Some(3), Some(25)), (3, 25));
    }

    #[test]
    fn test_normalize_page_caps_limit() {
        assert_eq!(normalize_page(Some(1), Some(10_000)), (1, MAX_PAGE_LIMIT));
        assert_eq!(normalize_page(Some(1), Some(200)), (1, 200));
    }
}
