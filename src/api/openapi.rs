//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HVAC Service Desk Server",
        version = "0.3.0",
        description = "Service-management API for HVAC jobs, invoices and technician reports with photo attachments"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Job endpoints
        api::jobs::create_job,
        api::jobs::list_jobs,
        api::jobs::get_job,
        api::jobs::update_job,
        api::jobs::assign_technician,
        api::jobs::delete_job,
        // Invoice endpoints
        api::invoices::create_invoice,
        api::invoices::list_invoices,
        api::invoices::get_invoice,
        api::invoices::patch_invoice,
        api::invoices::delete_invoice,
        api::invoices::report_payment,
        api::invoices::confirm_payment,
        // Report endpoints
        api::reports::list_reports_for_job,
        api::reports::create_report,
        api::reports::list_reports,
        api::reports::update_description,
        api::reports::add_photos,
        api::reports::delete_photo,
        api::reports::get_photo_file,
        // Auth endpoints
        api::auth_admin::create_key,
        api::auth_admin::list_keys,
        api::auth_admin::get_key,
        api::auth_admin::revoke_key,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Jobs
            models::JobStatus,
            models::CreateJobRequest,
            models::UpdateJobRequest,
            models::AssignTechnicianRequest,
            models::JobResponse,
            models::JobListResponse,
            models::ListJobsQuery,
            // Invoices
            models::InvoiceStatus,
            models::CreateInvoiceRequest,
            models::PatchInvoiceRequest,
            models::ReportPaymentRequest,
            models::InvoiceResponse,
            models::InvoiceListResponse,
            models::ListInvoicesQuery,
            // Reports
            models::PhotoResponse,
            models::ReportResponse,
            models::ReportListResponse,
            models::UpdateDescriptionRequest,
            api::reports::RejectedFile,
            api::reports::CreateReportResponse,
            api::reports::AddPhotosResponse,
            api::reports::ListReportsQuery,
            // Auth
            models::CreateApiKeyRequest,
            models::ApiKeyCreateResponse,
            models::ApiKeyListItem,
            api::auth_admin::ApiKeyListResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Jobs", description = "Service job lifecycle"),
        (name = "Invoices", description = "Invoicing and payment confirmation"),
        (name = "Reports", description = "Technician reports and photos"),
        (name = "Auth", description = "API key management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add API key security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-API-Key"),
                    ),
                ),
            );
        }
    }
}
