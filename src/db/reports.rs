//! Database queries for technician reports and their photos.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entity::report::{self, Entity as Report};
use crate::entity::report_photo::{self, Entity as ReportPhoto};
use crate::error::{AppError, AppResult};
use crate::services::Storage;

use super::DbPool;

/// Photo metadata recorded alongside an uploaded binary.
///
/// `stored_name` is the generated object filename (uuid + extension); the
/// full storage key is composed from the owning report's id.
pub struct NewPhoto {
    pub stored_name: String,
    pub original_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
}

impl DbPool {
    /// Insert a report and its initial photo rows in one transaction.
    pub async fn insert_report_with_photos(
        &self,
        job_id: i64,
        technician_id: i64,
        description: Option<String>,
        photos: Vec<NewPhoto>,
    ) -> AppResult<(report::Model, Vec<report_photo::Model>)> {
        let now = Utc::now();
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let model = report::ActiveModel {
            job_id: Set(job_id),
            technician_id: Set(technician_id),
            description: Set(description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert report: {}", e)))?;

        let mut photo_rows = Vec::with_capacity(photos.len());
        for photo in photos {
            let row = report_photo::ActiveModel {
                report_id: Set(inserted.id),
                file_key: Set(Storage::photo_key(inserted.id, &photo.stored_name)),
                original_name: Set(photo.original_name),
                content_type: Set(photo.content_type),
                size_bytes: Set(photo.size_bytes),
                created_at: Set(now),
                ..Default::default()
            };
            let row = row
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert photo: {}", e)))?;
            photo_rows.push(row);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit report insert: {}", e)))?;

        Ok((inserted, photo_rows))
    }

    /// Get a report by ID.
    pub async fn get_report_by_id(&self, id: i64) -> AppResult<Option<report::Model>> {
        let result = Report::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get report: {}", e)))?;

        Ok(result)
    }

    /// Update a report description.
    pub async fn update_report_description(
        &self,
        report: report::Model,
        description: String,
    ) -> AppResult<report::Model> {
        let mut active: report::ActiveModel = report.into();
        active.description = Set(Some(description));
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update report: {}", e)))?;

        Ok(result)
    }

    /// Append photo rows to an existing report.
    pub async fn add_photos(
        &self,
        report_id: i64,
        photos: Vec<NewPhoto>,
    ) -> AppResult<Vec<report_photo::Model>> {
        let now = Utc::now();
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut rows = Vec::with_capacity(photos.len());
        for photo in photos {
            let row = report_photo::ActiveModel {
                report_id: Set(report_id),
                file_key: Set(Storage::photo_key(report_id, &photo.stored_name)),
                original_name: Set(photo.original_name),
                content_type: Set(photo.content_type),
                size_bytes: Set(photo.size_bytes),
                created_at: Set(now),
                ..Default::default()
            };
            let row = row
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert photo: {}", e)))?;
            rows.push(row);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit photo insert: {}", e)))?;

        Ok(rows)
    }

    /// Get a photo by ID.
    pub async fn get_photo_by_id(&self, id: i64) -> AppResult<Option<report_photo::Model>> {
        let result = ReportPhoto::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get photo: {}", e)))?;

        Ok(result)
    }

    /// Get all photos on a report.
    pub async fn get_photos_for_report(
        &self,
        report_id: i64,
    ) -> AppResult<Vec<report_photo::Model>> {
        let result = ReportPhoto::find()
            .filter(report_photo::Column::ReportId.eq(report_id))
            .order_by_asc(report_photo::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get photos: {}", e)))?;

        Ok(result)
    }

    /// Delete a photo row. The stored binary is removed separately,
    /// best-effort, by the caller.
    pub async fn delete_photo_row(&self, id: i64) -> AppResult<bool> {
        let result = ReportPhoto::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete photo: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// All reports on a job, photos embedded, oldest first.
    pub async fn list_reports_for_job(
        &self,
        job_id: i64,
    ) -> AppResult<Vec<(report::Model, Vec<report_photo::Model>)>> {
        let result = Report::find()
            .filter(report::Column::JobId.eq(job_id))
            .order_by_asc(report::Column::Id)
            .find_with_related(ReportPhoto)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list reports for job: {}", e)))?;

        Ok(result)
    }

    /// All reports filed by a technician, newest first.
    pub async fn list_reports_for_technician(
        &self,
        technician_id: i64,
    ) -> AppResult<Vec<(report::Model, Vec<report_photo::Model>)>> {
        let result = Report::find()
            .filter(report::Column::TechnicianId.eq(technician_id))
            .order_by_desc(report::Column::Id)
            .find_with_related(ReportPhoto)
            .all(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to list reports for technician: {}", e))
            })?;

        Ok(result)
    }
}
