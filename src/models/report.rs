//! Technician report and photo DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Photo attachment on a report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PhotoResponse {
    pub id: i64,
    pub report_id: i64,
    /// Original filename, kept for display.
    pub original_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size_bytes: i64,
    /// Download path for the binary.
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::report_photo::Model> for PhotoResponse {
    fn from(m: crate::entity::report_photo::Model) -> Self {
        Self {
            id: m.id,
            report_id: m.report_id,
            original_name: m.original_name,
            content_type: m.content_type,
            size_bytes: m.size_bytes,
            url: format!("/api/v1/photos/{}/file", m.id),
            created_at: m.created_at,
        }
    }
}

/// Report representation returned by the API, photos embedded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: i64,
    pub job_id: i64,
    pub technician_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub photos: Vec<PhotoResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportResponse {
    pub fn from_parts(
        report: crate::entity::report::Model,
        photos: Vec<crate::entity::report_photo::Model>,
    ) -> Self {
        Self {
            id: report.id,
            job_id: report.job_id,
            technician_id: report.technician_id,
            description: report.description,
            photos: photos.into_iter().map(PhotoResponse::from).collect(),
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

/// Request to edit a report description (owning technician only).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

/// Report list response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportListResponse {
    pub reports: Vec<ReportResponse>,
}
