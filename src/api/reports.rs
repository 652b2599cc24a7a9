//! Technician report and photo API endpoints.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, patch, post, web};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ActorAuth;
use crate::config::Config;
use crate::db::{DbPool, reports::NewPhoto};
use crate::entity::{job, report_photo};
use crate::error::{AppError, AppResult};
use crate::models::{
    ActorContext, ReportListResponse, ReportResponse, Role, UpdateDescriptionRequest,
};
use crate::services::Storage;

/// Image extensions accepted for report photos.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Configure report and photo routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_reports_for_job)
        .service(create_report)
        .service(list_reports)
        .service(update_description)
        .service(add_photos)
        .service(delete_photo)
        .service(get_photo_file);
}

/// A file refused during upload, with the reason.
#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedFile {
    pub file: String,
    pub reason: String,
}

/// Response for report creation: the report plus any refused files.
#[derive(Serialize, ToSchema)]
pub struct CreateReportResponse {
    #[serde(flatten)]
    pub report: ReportResponse,
    pub rejected: Vec<RejectedFile>,
}

/// Response for appending photos to a report.
#[derive(Serialize, ToSchema)]
pub struct AddPhotosResponse {
    pub photos: Vec<crate::models::PhotoResponse>,
    pub rejected: Vec<RejectedFile>,
}

/// Query parameters for the report listing.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListReportsQuery {
    /// Required for admins; technicians are scoped to themselves.
    #[serde(default)]
    pub technician_id: Option<i64>,
}

/// An accepted photo: validated, fully read, ready for storage.
struct UploadedPhoto {
    original_name: String,
    stored_name: String,
    content_type: String,
    data: Vec<u8>,
}

/// Parsed multipart body: optional description plus photo files.
struct ReportUpload {
    description: Option<String>,
    photos: Vec<UploadedPhoto>,
    rejected: Vec<RejectedFile>,
}

/// Extract the lowercase extension when it is an accepted image type.
fn photo_extension(filename: &str) -> Option<String> {
    let ext = filename.rsplit('.').next()?.to_lowercase();
    if filename.contains('.') && ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// Read and discard the remainder of a multipart field.
async fn drain_field(field: &mut actix_multipart::Field) {
    while let Some(chunk) = field.next().await {
        if chunk.is_err() {
            break;
        }
    }
}

/// Process a multipart upload into a description and validated photos.
///
/// Photos are buffered in memory; each is capped at `max_photo_size` and the
/// request at `max_photos` files. Oversized, surplus and non-image files are
/// drained and reported back rather than failing the whole request.
async fn collect_report_upload(
    payload: &mut Multipart,
    max_photo_size: usize,
    max_photos: usize,
) -> AppResult<ReportUpload> {
    let mut description: Option<String> = None;
    let mut photos: Vec<UploadedPhoto> = Vec::new();
    let mut rejected: Vec<RejectedFile> = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };

        let filename = content_disposition.get_filename().map(|f| f.to_string());
        let field_name = content_disposition.get_name().unwrap_or("").to_string();

        let Some(filename) = filename else {
            // Text field: only "description" is recognized
            let mut buf: Vec<u8> = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
                buf.extend_from_slice(&chunk);
            }
            if field_name == "description" {
                let text = String::from_utf8(buf).map_err(|_| {
                    AppError::InvalidInput("description must be valid UTF-8".to_string())
                })?;
                description = Some(text);
            }
            continue;
        };

        if photos.len() >= max_photos {
            drain_field(&mut field).await;
            rejected.push(RejectedFile {
                file: filename,
                reason: format!("At most {} photos per request", max_photos),
            });
            continue;
        }

        let Some(ext) = photo_extension(&filename) else {
            drain_field(&mut field).await;
            rejected.push(RejectedFile {
                file: filename,
                reason: "Only png, jpg, jpeg, gif and webp files are accepted".to_string(),
            });
            continue;
        };

        let mut data: Vec<u8> = Vec::new();
        let mut oversized = false;
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            if data.len() + chunk.len() > max_photo_size {
                oversized = true;
                break;
            }
            data.extend_from_slice(&chunk);
        }
        if oversized {
            drain_field(&mut field).await;
            rejected.push(RejectedFile {
                file: filename,
                reason: format!("Photo exceeds the {} byte limit", max_photo_size),
            });
            continue;
        }
        if data.is_empty() {
            rejected.push(RejectedFile {
                file: filename,
                reason: "Empty file".to_string(),
            });
            continue;
        }

        let content_type = Storage::content_type_for_extension(&ext).to_string();
        photos.push(UploadedPhoto {
            original_name: filename,
            stored_name: format!("{}.{}", Uuid::new_v4(), ext),
            content_type,
            data,
        });
    }

    Ok(ReportUpload {
        description,
        photos,
        rejected,
    })
}

/// Fold per-photo upload outcomes into surviving rows and rejected files.
///
/// Rows whose binary failed to store are returned separately so the caller
/// can remove them; the response must never point at a missing object.
fn reconcile_photo_uploads(
    outcomes: Vec<(report_photo::Model, String, Result<(), String>)>,
) -> (Vec<report_photo::Model>, Vec<(i64, RejectedFile)>) {
    let mut kept = Vec::new();
    let mut failed = Vec::new();
    for (row, original_name, outcome) in outcomes {
        match outcome {
            Ok(()) => kept.push(row),
            Err(reason) => failed.push((
                row.id,
                RejectedFile {
                    file: original_name,
                    reason: format!("Storage upload failed: {}", reason),
                },
            )),
        }
    }
    (kept, failed)
}

/// Whether the actor may read reports on this job.
fn can_view_job_reports(actor: &ActorContext, job: &job::Model) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Client => job.client_id == actor.id,
        Role::Technician => job.technician_id == Some(actor.id),
    }
}

/// List reports on a job, photos embedded.
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}/reports",
    tag = "Reports",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Reports for the job", body = ReportListResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[get("/jobs/{id}/reports")]
pub async fn list_reports_for_job(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let job_id = path.into_inner();
    let job = pool
        .get_job_by_id(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;

    if !can_view_job_reports(&auth.actor, &job) {
        return Err(AppError::Forbidden("No access to this job".to_string()));
    }

    let reports = pool.list_reports_for_job(job_id).await?;
    Ok(HttpResponse::Ok().json(ReportListResponse {
        reports: reports
            .into_iter()
            .map(|(report, photos)| ReportResponse::from_parts(report, photos))
            .collect(),
    }))
}

/// File a report on a job (owning technician only).
///
/// Multipart body: an optional `description` text field plus photo files.
/// A report needs a non-blank description and/or at least one accepted
/// photo. Report row and photo rows are written in one transaction; the
/// binaries are then uploaded under a report-scoped key. A photo whose
/// upload fails has its row removed and shows up in `rejected`.
#[utoipa::path(
    post,
    path = "/api/v1/jobs/{id}/reports",
    tag = "Reports",
    params(("id" = i64, Path, description = "Job ID")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Report created", body = CreateReportResponse),
        (status = 400, description = "Empty report or all files rejected", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[post("/jobs/{id}/reports")]
pub async fn create_report(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    auth: ActorAuth,
    path: web::Path<i64>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    if !auth.actor.is_technician() {
        return Err(AppError::Forbidden(
            "Only technicians can file reports".to_string(),
        ));
    }

    let job_id = path.into_inner();
    let job = pool
        .get_job_by_id(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;

    if job.technician_id != Some(auth.actor.id) {
        return Err(AppError::Forbidden(
            "Job is not assigned to this technician".to_string(),
        ));
    }

    let upload = collect_report_upload(
        &mut payload,
        config.max_photo_size,
        config.max_photos_per_request,
    )
    .await?;

    let description = upload
        .description
        .filter(|d| !d.trim().is_empty());
    if description.is_none() && upload.photos.is_empty() {
        let mut message = "A report needs a description or at least one photo".to_string();
        if !upload.rejected.is_empty() {
            let reasons: Vec<String> = upload
                .rejected
                .iter()
                .map(|r| format!("{}: {}", r.file, r.reason))
                .collect();
            message = format!("{} ({})", message, reasons.join("; "));
        }
        return Err(AppError::InvalidInput(message));
    }

    let new_photos: Vec<NewPhoto> = upload
        .photos
        .iter()
        .map(|p| NewPhoto {
            stored_name: p.stored_name.clone(),
            original_name: p.original_name.clone(),
            content_type: Some(p.content_type.clone()),
            size_bytes: p.data.len() as i64,
        })
        .collect();

    let (report, photo_rows) = pool
        .insert_report_with_photos(job_id, auth.actor.id, description, new_photos)
        .await?;

    // Rows insert in upload order, so the two vectors zip one-to-one. A
    // failed put must not surface as a photo whose download would 404;
    // the row is removed and the file reported back as rejected instead.
    let mut outcomes = Vec::with_capacity(photo_rows.len());
    for (photo, row) in upload.photos.into_iter().zip(photo_rows) {
        let result = storage
            .put(&row.file_key, photo.data, Some(&photo.content_type))
            .await
            .map_err(|e| e.to_string());
        outcomes.push((row, photo.original_name, result));
    }

    let (photo_rows, failed) = reconcile_photo_uploads(outcomes);
    let mut rejected = upload.rejected;
    for (row_id, rejected_file) in failed {
        warn!(
            "Removing photo row {} after failed upload: {}",
            row_id, rejected_file.reason
        );
        if let Err(e) = pool.delete_photo_row(row_id).await {
            warn!("Failed to remove photo row {}: {}", row_id, e);
        }
        rejected.push(rejected_file);
    }

    Ok(HttpResponse::Created().json(CreateReportResponse {
        report: ReportResponse::from_parts(report, photo_rows),
        rejected,
    }))
}

/// List reports filed by a technician.
///
/// Technicians see their own reports; admins may query any technician.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "Reports",
    params(
        ("technician_id" = Option<i64>, Query, description = "Technician ID (required for admins)")
    ),
    responses(
        (status = 200, description = "Reports for the technician", body = ReportListResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[get("/reports")]
pub async fn list_reports(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    query: web::Query<ListReportsQuery>,
) -> AppResult<HttpResponse> {
    let technician_id = match auth.actor.role {
        Role::Technician => {
            if let Some(requested) = query.technician_id
                && requested != auth.actor.id
            {
                return Err(AppError::Forbidden(
                    "Technicians can only list their own reports".to_string(),
                ));
            }
            auth.actor.id
        }
        Role::Admin => query.technician_id.ok_or_else(|| {
            AppError::InvalidInput("technician_id is required".to_string())
        })?,
        Role::Client => {
            return Err(AppError::Forbidden(
                "Clients can only read reports through their jobs".to_string(),
            ));
        }
    };

    let reports = pool.list_reports_for_technician(technician_id).await?;
    Ok(HttpResponse::Ok().json(ReportListResponse {
        reports: reports
            .into_iter()
            .map(|(report, photos)| ReportResponse::from_parts(report, photos))
            .collect(),
    }))
}

/// Edit a report description (owning technician only).
#[utoipa::path(
    patch,
    path = "/api/v1/reports/{id}",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report ID")),
    request_body = UpdateDescriptionRequest,
    responses(
        (status = 200, description = "Updated report", body = ReportResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Report not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[patch("/reports/{id}")]
pub async fn update_description(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
    body: web::Json<UpdateDescriptionRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let report = pool
        .get_report_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

    if !auth.actor.is_technician() || report.technician_id != auth.actor.id {
        return Err(AppError::Forbidden(
            "Only the reporting technician can edit a report".to_string(),
        ));
    }

    if body.description.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "description must not be blank".to_string(),
        ));
    }

    let updated = pool
        .update_report_description(report, body.into_inner().description)
        .await?;
    let photos = pool.get_photos_for_report(updated.id).await?;

    Ok(HttpResponse::Ok().json(ReportResponse::from_parts(updated, photos)))
}

/// Append photos to a report (owning technician only).
#[utoipa::path(
    post,
    path = "/api/v1/reports/{id}/photos",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report ID")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Photos added", body = AddPhotosResponse),
        (status = 400, description = "No accepted photos", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Report not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[post("/reports/{id}/photos")]
pub async fn add_photos(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    auth: ActorAuth,
    path: web::Path<i64>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let report = pool
        .get_report_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

    if !auth.actor.is_technician() || report.technician_id != auth.actor.id {
        return Err(AppError::Forbidden(
            "Only the reporting technician can add photos".to_string(),
        ));
    }

    let upload = collect_report_upload(
        &mut payload,
        config.max_photo_size,
        config.max_photos_per_request,
    )
    .await?;

    if upload.photos.is_empty() {
        let reasons: Vec<String> = upload
            .rejected
            .iter()
            .map(|r| format!("{}: {}", r.file, r.reason))
            .collect();
        return Err(AppError::InvalidInput(format!(
            "No accepted photos in request ({})",
            reasons.join("; ")
        )));
    }

    // The report exists, so the storage keys are known before the rows
    for photo in &upload.photos {
        let key = Storage::photo_key(report.id, &photo.stored_name);
        storage
            .put(&key, photo.data.clone(), Some(&photo.content_type))
            .await?;
    }

    let new_photos: Vec<NewPhoto> = upload
        .photos
        .into_iter()
        .map(|p| NewPhoto {
            size_bytes: p.data.len() as i64,
            stored_name: p.stored_name,
            original_name: p.original_name,
            content_type: Some(p.content_type),
        })
        .collect();

    let rows = pool.add_photos(report.id, new_photos).await?;

    Ok(HttpResponse::Created().json(AddPhotosResponse {
        photos: rows
            .into_iter()
            .map(crate::models::PhotoResponse::from)
            .collect(),
        rejected: upload.rejected,
    }))
}

/// Delete a photo (owning technician only).
///
/// The stored binary is deleted best-effort before the row; a storage
/// failure is logged and never blocks the delete.
#[utoipa::path(
    delete,
    path = "/api/v1/photos/{id}",
    tag = "Reports",
    params(("id" = i64, Path, description = "Photo ID")),
    responses(
        (status = 204, description = "Photo deleted"),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Photo not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[delete("/photos/{id}")]
pub async fn delete_photo(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    auth: ActorAuth,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let photo = pool
        .get_photo_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Photo {}", id)))?;

    // Ownership lives on the parent report
    let report = pool
        .get_report_by_id(photo.report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", photo.report_id)))?;

    if !auth.actor.is_technician() || report.technician_id != auth.actor.id {
        return Err(AppError::Forbidden(
            "Only the reporting technician can delete photos".to_string(),
        ));
    }

    if let Err(e) = storage.delete(&photo.file_key).await {
        warn!("Failed to delete stored photo {}: {}", photo.file_key, e);
    }

    if !pool.delete_photo_row(id).await? {
        return Err(AppError::NotFound(format!("Photo {}", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Download a photo binary.
///
/// Report-scoped access: the reporting technician, the job's client, or an
/// admin.
#[utoipa::path(
    get,
    path = "/api/v1/photos/{id}/file",
    tag = "Reports",
    params(("id" = i64, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo binary"),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Photo not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[get("/photos/{id}/file")]
pub async fn get_photo_file(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    auth: ActorAuth,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let photo = pool
        .get_photo_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Photo {}", id)))?;

    let report = pool
        .get_report_by_id(photo.report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", photo.report_id)))?;

    let allowed = match auth.actor.role {
        Role::Admin => true,
        Role::Technician => report.technician_id == auth.actor.id,
        Role::Client => match pool.get_job_by_id(report.job_id).await? {
            Some(job) => job.client_id == auth.actor.id,
            None => false,
        },
    };
    if !allowed {
        return Err(AppError::Forbidden("No access to this photo".to_string()));
    }

    let (data, content_type) = storage.get(&photo.file_key).await?;
    let content_type = content_type
        .or(photo.content_type)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(HttpResponse::Ok().content_type(content_type).body(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_photo_extension_filter() {
        assert_eq!(photo_extension("a.png"), Some("png".to_string()));
        assert_eq!(photo_extension("boiler.JPG"), Some("jpg".to_string()));
        assert_eq!(photo_extension("x.y.jpeg"), Some("jpeg".to_string()));
        assert_eq!(photo_extension("leak.webp"), Some("webp".to_string()));
        assert_eq!(photo_extension("notes.pdf"), None);
        assert_eq!(photo_extension("video.mp4"), None);
        assert_eq!(photo_extension("noextension"), None);
    }

    fn photo_row(id: i64) -> report_photo::Model {
        report_photo::Model {
            id,
            report_id: 7,
            file_key: format!("reports/7/photos/{}.png", id),
            original_name: format!("{}.png", id),
            content_type: Some("image/png".to_string()),
            size_bytes: 100,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reconcile_photo_uploads_drops_failed_rows() {
        let outcomes = vec![
            (photo_row(1), "before.png".to_string(), Ok(())),
            (
                photo_row(2),
                "leak.png".to_string(),
                Err("connection reset".to_string()),
            ),
            (photo_row(3), "after.png".to_string(), Ok(())),
        ];

        let (kept, failed) = reconcile_photo_uploads(outcomes);

        let kept_ids: Vec<i64> = kept.iter().map(|r| r.id).collect();
        assert_eq!(kept_ids, vec![1, 3]);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, 2);
        assert_eq!(failed[0].1.file, "leak.png");
        assert!(failed[0].1.reason.contains("connection reset"));
    }

    #[test]
    fn test_reconcile_photo_uploads_keeps_all_on_success() {
        let outcomes = vec![
            (photo_row(1), "a.png".to_string(), Ok(())),
            (photo_row(2), "b.png".to_string(), Ok(())),
        ];

        let (kept, failed) = reconcile_photo_uploads(outcomes);
        assert_eq!(kept.len(), 2);
        assert!(failed.is_empty());
    }

    fn job_model(client_id: i64, technician_id: Option<i64>) -> job::Model {
        let now = Utc::now();
        job::Model {
            id: 1,
            external_number: "JOB-2026-000001".to_string(),
            client_id,
            technician_id,
            title: "t".to_string(),
            description: None,
            status: "assigned".to_string(),
            priority: 3,
            scheduled_date: None,
            address: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn test_report_view_scoping() {
        let admin = ActorContext {
            id: 1,
            role: Role::Admin,
        };
        let client = ActorContext {
            id: 10,
            role: Role::Client,
        };
        let tech = ActorContext {
            id: 20,
            role: Role::Technician,
        };

        let job = job_model(10, Some(20));
        assert!(can_view_job_reports(&admin, &job));
        assert!(can_view_job_reports(&client, &job));
        assert!(can_view_job_reports(&tech, &job));

        let other_job = job_model(11, Some(21));
        assert!(!can_view_job_reports(&client, &other_job));
        assert!(!can_view_job_reports(&tech, &other_job));
    }
}
