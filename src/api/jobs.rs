//! Job API endpoints.

use actix_web::{HttpResponse, delete, get, patch, post, web};

use crate::auth::ActorAuth;
use crate::db::{DbPool, jobs::NewJob};
use crate::error::{AppError, AppResult};
use crate::models::{
    ActorContext, AssignTechnicianRequest, CreateJobRequest, JobListResponse, JobResponse,
    JobStatus, ListJobsQuery, Role, UpdateJobRequest, normalize_page,
};

/// Configure job routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_job)
        .service(list_jobs)
        .service(assign_technician)
        .service(get_job)
        .service(update_job)
        .service(delete_job);
}

/// Whether the actor may read this job.
fn can_view_job(actor: &ActorContext, client_id: i64, technician_id: Option<i64>) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Client => client_id == actor.id,
        Role::Technician => technician_id == Some(actor.id),
    }
}

/// Validate an update request against the actor's role and the job's current
/// state. Pure decision logic; the caller applies the change afterwards.
fn authorize_job_update(
    actor: &ActorContext,
    job_technician_id: Option<i64>,
    current: JobStatus,
    update: &UpdateJobRequest,
) -> AppResult<()> {
    if update.client_id.is_some() {
        return Err(AppError::InvalidInput(
            "client_id is immutable after creation".to_string(),
        ));
    }

    match actor.role {
        Role::Client => Err(AppError::Forbidden(
            "Clients cannot modify jobs".to_string(),
        )),
        Role::Technician => {
            if job_technician_id != Some(actor.id) {
                return Err(AppError::Forbidden(
                    "Job is not assigned to this technician".to_string(),
                ));
            }
            if update.touches_non_status_fields() {
                return Err(AppError::Forbidden(
                    "Technicians may only change the job status".to_string(),
                ));
            }
            let Some(target) = update.status else {
                return Err(AppError::InvalidInput("No fields to update".to_string()));
            };
            if !target.technician_may_target() {
                return Err(AppError::Forbidden(format!(
                    "Technicians cannot move a job to '{}'",
                    target
                )));
            }
            check_transition(current, target)
        }
        Role::Admin => {
            if let Some(target) = update.status {
                check_transition(current, target)?;
            }
            Ok(())
        }
    }
}

/// Transition-table check shared by admin and technician updates.
fn check_transition(current: JobStatus, target: JobStatus) -> AppResult<()> {
    if !JobStatus::can_transition(current, target) {
        return Err(AppError::Conflict(format!(
            "Cannot move job from '{}' to '{}'",
            current, target
        )));
    }
    Ok(())
}

/// Create a new job.
///
/// Admins create for any client (initial status `waiting`, or `assigned` when
/// a technician is supplied). Clients create only for themselves (initial
/// status `to_assign`, no technician allowed).
#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    tag = "Jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job created", body = JobResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[post("/jobs")]
pub async fn create_job(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    body: web::Json<CreateJobRequest>,
) -> AppResult<HttpResponse> {
    let actor = auth.actor;
    let req = body.into_inner();

    if req.title.trim().is_empty() {
        return Err(AppError::InvalidInput("title must not be blank".to_string()));
    }
    let priority = req.priority.unwrap_or(3);
    if !(1..=5).contains(&priority) {
        return Err(AppError::InvalidInput(
            "priority must be between 1 and 5".to_string(),
        ));
    }

    let (client_id, technician_id, status) = match actor.role {
        Role::Admin => {
            let client_id = req.client_id.ok_or_else(|| {
                AppError::InvalidInput("client_id is required".to_string())
            })?;
            pool.get_user_with_role(client_id, Role::Client).await?;

            let status = if let Some(technician_id) = req.technician_id {
                pool.get_user_with_role(technician_id, Role::Technician)
                    .await?;
                JobStatus::Assigned
            } else {
                JobStatus::Waiting
            };
            (client_id, req.technician_id, status)
        }
        Role::Client => {
            if let Some(client_id) = req.client_id {
                if client_id != actor.id {
                    return Err(AppError::Forbidden(
                        "Clients can only create jobs for themselves".to_string(),
                    ));
                }
            }
            if req.technician_id.is_some() {
                return Err(AppError::Forbidden(
                    "Clients cannot assign technicians".to_string(),
                ));
            }
            (actor.id, None, JobStatus::ToAssign)
        }
        Role::Technician => {
            return Err(AppError::Forbidden(
                "Technicians cannot create jobs".to_string(),
            ));
        }
    };

    let job = pool
        .insert_job(NewJob {
            client_id,
            technician_id,
            title: req.title,
            description: req.description,
            status,
            priority,
            scheduled_date: req.scheduled_date,
            address: req.address,
        })
        .await?;

    Ok(HttpResponse::Created().json(JobResponse::from(job)))
}

/// List jobs visible to the actor.
///
/// Clients see their own jobs, technicians their assigned jobs, admins
/// everything with optional filters.
#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    tag = "Jobs",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("technician_id" = Option<i64>, Query, description = "Filter by technician (admin)"),
        ("client_id" = Option<i64>, Query, description = "Filter by client (admin)"),
        ("q" = Option<String>, Query, description = "Free-text match on number/title"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 50, max: 200)"),
        ("sort" = Option<String>, Query, description = "created_at | scheduled_date | priority | id")
    ),
    responses(
        (status = 200, description = "List of jobs", body = JobListResponse)
    ),
    security(("api_key" = []))
)]
#[get("/jobs")]
pub async fn list_jobs(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    query: web::Query<ListJobsQuery>,
) -> AppResult<HttpResponse> {
    let (page, limit) = normalize_page(query.page, query.limit);
    let (jobs, total) = pool.query_jobs(&auth.actor, &query, page, limit).await?;

    Ok(HttpResponse::Ok().json(JobListResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
        page,
        limit,
    }))
}

/// Get a job by ID.
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    tag = "Jobs",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job details", body = JobResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[get("/jobs/{id}")]
pub async fn get_job(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let job = pool
        .get_job_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))?;

    if !can_view_job(&auth.actor, job.client_id, job.technician_id) {
        return Err(AppError::Forbidden("No access to this job".to_string()));
    }

    Ok(HttpResponse::Ok().json(JobResponse::from(job)))
}

/// Update a job.
///
/// Admins may change any mutable field; technicians may move their own jobs
/// to in_progress, done or cancelled. Status changes are checked against the
/// lifecycle transition table.
#[utoipa::path(
    patch,
    path = "/api/v1/jobs/{id}",
    tag = "Jobs",
    params(("id" = i64, Path, description = "Job ID")),
    request_body = UpdateJobRequest,
    responses(
        (status = 200, description = "Updated job", body = JobResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Illegal status transition", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[patch("/jobs/{id}")]
pub async fn update_job(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
    body: web::Json<UpdateJobRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let update = body.into_inner();

    let job = pool
        .get_job_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))?;

    let current = JobStatus::parse(&job.status).unwrap_or(JobStatus::Waiting);
    authorize_job_update(&auth.actor, job.technician_id, current, &update)?;

    if let Some(technician_id) = update.technician_id {
        pool.get_user_with_role(technician_id, Role::Technician)
            .await?;
    }
    if let Some(priority) = update.priority
        && !(1..=5).contains(&priority)
    {
        return Err(AppError::InvalidInput(
            "priority must be between 1 and 5".to_string(),
        ));
    }

    let updated = pool.update_job(job, &update).await?;
    Ok(HttpResponse::Ok().json(JobResponse::from(updated)))
}

/// Assign a technician to a job (admin only).
///
/// Sets the technician and forces the status to `assigned` regardless of the
/// previous status. This is the single sanctioned lifecycle reset.
#[utoipa::path(
    post,
    path = "/api/v1/jobs/{id}/assign",
    tag = "Jobs",
    params(("id" = i64, Path, description = "Job ID")),
    request_body = AssignTechnicianRequest,
    responses(
        (status = 200, description = "Updated job", body = JobResponse),
        (status = 400, description = "Missing technician_id", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[post("/jobs/{id}/assign")]
pub async fn assign_technician(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
    body: web::Json<AssignTechnicianRequest>,
) -> AppResult<HttpResponse> {
    if !auth.actor.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can assign technicians".to_string(),
        ));
    }

    let technician_id = body.technician_id.ok_or_else(|| {
        AppError::InvalidInput("technician_id is required".to_string())
    })?;

    let id = path.into_inner();
    let job = pool
        .get_job_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))?;

    pool.get_user_with_role(technician_id, Role::Technician)
        .await?;

    let updated = pool.assign_technician(job, technician_id).await?;
    Ok(HttpResponse::Ok().json(JobResponse::from(updated)))
}

/// Delete a job (admin only). Reports on the job are removed by cascade.
#[utoipa::path(
    delete,
    path = "/api/v1/jobs/{id}",
    tag = "Jobs",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[delete("/jobs/{id}")]
pub async fn delete_job(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    if !auth.actor.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete jobs".to_string(),
        ));
    }

    let id = path.into_inner();
    if !pool.delete_job(id).await? {
        return Err(AppError::NotFound(format!("Job {}", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: i64, role: Role) -> ActorContext {
        ActorContext { id, role }
    }

    #[test]
    fn test_view_scoping() {
        let admin = actor(1, Role::Admin);
        let client = actor(10, Role::Client);
        let tech = actor(20, Role::Technician);

        assert!(can_view_job(&admin, 10, Some(20)));
        assert!(can_view_job(&client, 10, None));
        assert!(!can_view_job(&client, 11, None));
        assert!(can_view_job(&tech, 10, Some(20)));
        assert!(!can_view_job(&tech, 10, Some(21)));
        assert!(!can_view_job(&tech, 10, None));
    }

    #[test]
    fn test_client_cannot_update() {
        let update = UpdateJobRequest {
            status: Some(JobStatus::Cancelled),
            ..Default::default()
        };
        let err = authorize_job_update(
            &actor(10, Role::Client),
            None,
            JobStatus::ToAssign,
            &update,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_technician_owner_and_target_rule() {
        let tech = actor(20, Role::Technician);

        // Owned job, allowed target
        let update = UpdateJobRequest {
            status: Some(JobStatus::InProgress),
            ..Default::default()
        };
        assert!(
            authorize_job_update(&tech, Some(20), JobStatus::Assigned, &update).is_ok()
        );

        // Not the owner
        let err =
            authorize_job_update(&tech, Some(21), JobStatus::Assigned, &update).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Owned job, target outside the technician set
        let update = UpdateJobRequest {
            status: Some(JobStatus::Assigned),
            ..Default::default()
        };
        let err =
            authorize_job_update(&tech, Some(20), JobStatus::InProgress, &update).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Owned job, non-status field
        let update = UpdateJobRequest {
            title: Some("new title".to_string()),
            ..Default::default()
        };
        let err =
            authorize_job_update(&tech, Some(20), JobStatus::Assigned, &update).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_admin_bound_by_transition_table() {
        let admin = actor(1, Role::Admin);

        let update = UpdateJobRequest {
            status: Some(JobStatus::Waiting),
            ..Default::default()
        };
        let err = authorize_job_update(&admin, None, JobStatus::Done, &update).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let update = UpdateJobRequest {
            status: Some(JobStatus::Cancelled),
            ..Default::default()
        };
        assert!(authorize_job_update(&admin, None, JobStatus::InProgress, &update).is_ok());
    }

    #[test]
    fn test_client_id_is_immutable() {
        let admin = actor(1, Role::Admin);
        let update = UpdateJobRequest {
            client_id: Some(99),
            ..Default::default()
        };
        let err = authorize_job_update(&admin, None, JobStatus::Waiting, &update).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_technician_cancelling_terminal_job_conflicts() {
        let tech = actor(20, Role::Technician);
        let update = UpdateJobRequest {
            status: Some(JobStatus::Cancelled),
            ..Default::default()
        };
        let err =
            authorize_job_update(&tech, Some(20), JobStatus::Done, &update).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
