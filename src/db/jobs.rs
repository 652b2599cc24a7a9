//! Database queries for jobs.

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entity::job::{self, ActiveModel, Entity as Job};
use crate::error::{AppError, AppResult};
use crate::models::{ActorContext, JobSortField, JobStatus, ListJobsQuery, Role, UpdateJobRequest};
use crate::services::numbering;

use super::DbPool;

/// Fields accepted by [`DbPool::insert_job`].
pub struct NewJob {
    pub client_id: i64,
    pub technician_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: JobStatus,
    pub priority: i16,
    pub scheduled_date: Option<NaiveDate>,
    pub address: Option<String>,
}

impl DbPool {
    /// Insert a new job and allocate its external number.
    ///
    /// The number derives from the freshly assigned primary key and is written
    /// in the same transaction as the insert, so it is visible only once the
    /// row is durably committed.
    pub async fn insert_job(&self, new: NewJob) -> AppResult<job::Model> {
        let now = Utc::now();
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let model = ActiveModel {
            external_number: Set(String::new()),
            client_id: Set(new.client_id),
            technician_id: Set(new.technician_id),
            title: Set(new.title),
            description: Set(new.description),
            status: Set(new.status.as_str().to_string()),
            priority: Set(new.priority),
            scheduled_date: Set(new.scheduled_date),
            address: Set(new.address),
            created_at: Set(now),
            updated_at: Set(now),
            completed_at: Set(None),
            ..Default::default()
        };

        let inserted = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert job: {}", e)))?;

        let number = numbering::job_number(now.year(), inserted.id);
        let mut active: ActiveModel = inserted.into();
        active.external_number = Set(number);

        let result = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to set job number: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit job insert: {}", e)))?;

        Ok(result)
    }

    /// Get a job by ID.
    pub async fn get_job_by_id(&self, id: i64) -> AppResult<Option<job::Model>> {
        let result = Job::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get job: {}", e)))?;

        Ok(result)
    }

    /// Apply an already-authorized field update to a job.
    ///
    /// `external_number` and `client_id` are immutable and never touched here.
    /// Moving to done stamps `completed_at` unless the caller supplied one.
    pub async fn update_job(
        &self,
        job: job::Model,
        update: &UpdateJobRequest,
    ) -> AppResult<job::Model> {
        let now = Utc::now();
        let mut active: ActiveModel = job.into();

        if let Some(technician_id) = update.technician_id {
            active.technician_id = Set(Some(technician_id));
        }
        if let Some(ref title) = update.title {
            active.title = Set(title.clone());
        }
        if let Some(ref description) = update.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(priority) = update.priority {
            active.priority = Set(priority);
        }
        if let Some(scheduled_date) = update.scheduled_date {
            active.scheduled_date = Set(Some(scheduled_date));
        }
        if let Some(ref address) = update.address {
            active.address = Set(Some(address.clone()));
        }
        if let Some(completed_at) = update.completed_at {
            active.completed_at = Set(Some(completed_at));
        }
        if let Some(status) = update.status {
            active.status = Set(status.as_str().to_string());
            if status == JobStatus::Done && update.completed_at.is_none() {
                active.completed_at = Set(Some(now));
            }
        }
        active.updated_at = Set(now);

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update job: {}", e)))?;

        Ok(result)
    }

    /// Set the technician and force status to assigned.
    ///
    /// The single sanctioned hard reset: reassignment lands on `assigned`
    /// regardless of the previous status, including in_progress.
    pub async fn assign_technician(
        &self,
        job: job::Model,
        technician_id: i64,
    ) -> AppResult<job::Model> {
        let mut active: ActiveModel = job.into();
        active.technician_id = Set(Some(technician_id));
        active.status = Set(JobStatus::Assigned.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to assign technician: {}", e)))?;

        Ok(result)
    }

    /// Physically delete a job. Returns false when it did not exist.
    pub async fn delete_job(&self, id: i64) -> AppResult<bool> {
        let result = Job::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete job: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// Query jobs scoped by the actor's role, with filters and pagination.
    ///
    /// Clients see their own jobs, technicians their assigned jobs; admins
    /// see everything and may filter freely.
    pub async fn query_jobs(
        &self,
        actor: &ActorContext,
        query: &ListJobsQuery,
        page: u32,
        limit: u32,
    ) -> AppResult<(Vec<job::Model>, u64)> {
        let mut select = Job::find();

        // Role scoping comes first and is not overridable by filters
        match actor.role {
            Role::Client => {
                select = select.filter(job::Column::ClientId.eq(actor.id));
            }
            Role::Technician => {
                select = select.filter(job::Column::TechnicianId.eq(actor.id));
            }
            Role::Admin => {
                if let Some(client_id) = query.client_id {
                    select = select.filter(job::Column::ClientId.eq(client_id));
                }
                if let Some(technician_id) = query.technician_id {
                    select = select.filter(job::Column::TechnicianId.eq(technician_id));
                }
            }
        }

        if let Some(status) = query.status {
            select = select.filter(job::Column::Status.eq(status.as_str()));
        }

        if let Some(ref q) = query.q {
            let pattern = format!("%{}%", q);
            select = select.filter(
                Condition::any()
                    .add(Expr::cust_with_values(
                        "external_number ILIKE $1",
                        [pattern.clone()],
                    ))
                    .add(Expr::cust_with_values("title ILIKE $1", [pattern])),
            );
        }

        // Count total before pagination
        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count jobs: {}", e)))?;

        let sort = query
            .sort
            .as_deref()
            .map(|s| {
                JobSortField::parse(s).ok_or_else(|| {
                    AppError::InvalidInput(format!("Unknown sort field '{}'", s))
                })
            })
            .transpose()?
            .unwrap_or(JobSortField::CreatedAt);

        let select = match sort {
            JobSortField::CreatedAt => select.order_by_desc(job::Column::CreatedAt),
            JobSortField::ScheduledDate => select.order_by_asc(job::Column::ScheduledDate),
            JobSortField::Priority => select.order_by_asc(job::Column::Priority),
            JobSortField::Id => select.order_by_desc(job::Column::Id),
        };

        let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let jobs = select
            .offset(offset)
            .limit(u64::from(limit))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query jobs: {}", e)))?;

        Ok((jobs, total))
    }
}
