//! Database queries for invoices.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entity::invoice::{self, ActiveModel, Entity as Invoice};
use crate::error::{AppError, AppResult};
use crate::models::{ActorContext, InvoiceStatus, ListInvoicesQuery, PatchInvoiceRequest, Role};
use crate::services::numbering;

use super::DbPool;

/// Fields accepted by [`DbPool::insert_invoice`].
pub struct NewInvoice {
    pub client_id: i64,
    pub job_id: Option<i64>,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl DbPool {
    /// Insert a new invoice and allocate its external number.
    ///
    /// Same scheme as jobs: the number derives from the primary key inside the
    /// creating transaction, which makes it collision-free by construction.
    pub async fn insert_invoice(&self, new: NewInvoice) -> AppResult<invoice::Model> {
        let now = Utc::now();
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let model = ActiveModel {
            external_number: Set(String::new()),
            client_id: Set(new.client_id),
            job_id: Set(new.job_id),
            amount: Set(new.amount),
            currency: Set(new.currency),
            description: Set(new.description),
            status: Set(InvoiceStatus::Issued.as_str().to_string()),
            payment_method: Set(None),
            payment_note: Set(None),
            issued_at: Set(now),
            due_date: Set(new.due_date),
            paid_at: Set(None),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert invoice: {}", e)))?;

        let number = numbering::invoice_number(now.year(), inserted.id);
        let mut active: ActiveModel = inserted.into();
        active.external_number = Set(number);

        let result = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to set invoice number: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit invoice insert: {}", e)))?;

        Ok(result)
    }

    /// Get an invoice by ID.
    pub async fn get_invoice_by_id(&self, id: i64) -> AppResult<Option<invoice::Model>> {
        let result = Invoice::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get invoice: {}", e)))?;

        Ok(result)
    }

    /// Apply an admin patch. Status, paid_at and external_number are never
    /// touched here; status moves only through the payment operations.
    pub async fn patch_invoice(
        &self,
        invoice: invoice::Model,
        patch: &PatchInvoiceRequest,
    ) -> AppResult<invoice::Model> {
        let mut active: ActiveModel = invoice.into();

        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(ref currency) = patch.currency {
            active.currency = Set(currency.clone());
        }
        if let Some(ref description) = patch.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(job_id) = patch.job_id {
            active.job_id = Set(Some(job_id));
        }
        if let Some(due_date) = patch.due_date {
            active.due_date = Set(Some(due_date));
        }
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to patch invoice: {}", e)))?;

        Ok(result)
    }

    /// Record a client-reported payment: pending_confirmation plus the
    /// reported method and note.
    pub async fn set_payment_reported(
        &self,
        invoice: invoice::Model,
        method: String,
        note: Option<String>,
    ) -> AppResult<invoice::Model> {
        let mut active: ActiveModel = invoice.into();
        active.status = Set(InvoiceStatus::PendingConfirmation.as_str().to_string());
        active.payment_method = Set(Some(method));
        active.payment_note = Set(note);
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to report payment: {}", e)))?;

        Ok(result)
    }

    /// Mark an invoice paid and stamp paid_at.
    pub async fn set_paid(&self, invoice: invoice::Model) -> AppResult<invoice::Model> {
        let now = Utc::now();
        let mut active: ActiveModel = invoice.into();
        active.status = Set(InvoiceStatus::Paid.as_str().to_string());
        active.paid_at = Set(Some(now));
        active.updated_at = Set(now);

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to confirm payment: {}", e)))?;

        Ok(result)
    }

    /// Physically delete an invoice. Returns false when it did not exist.
    pub async fn delete_invoice(&self, id: i64) -> AppResult<bool> {
        let result = Invoice::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete invoice: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// Query invoices scoped by the actor's role, with filters and pagination.
    pub async fn query_invoices(
        &self,
        actor: &ActorContext,
        query: &ListInvoicesQuery,
        page: u32,
        limit: u32,
    ) -> AppResult<(Vec<invoice::Model>, u64)> {
        let mut select = Invoice::find();

        match actor.role {
            Role::Client => {
                select = select.filter(invoice::Column::ClientId.eq(actor.id));
            }
            Role::Admin => {
                if let Some(client_id) = query.client_id {
                    select = select.filter(invoice::Column::ClientId.eq(client_id));
                }
            }
            // Technicians have no invoice surface; rejected before we get here
            Role::Technician => {
                return Ok((Vec::new(), 0));
            }
        }

        if let Some(status) = query.status {
            select = select.filter(invoice::Column::Status.eq(status.as_str()));
        }

        if let Some(job_id) = query.job_id {
            select = select.filter(invoice::Column::JobId.eq(job_id));
        }

        if let Some(ref q) = query.q {
            let pattern = format!("%{}%", q);
            select = select.filter(
                Condition::any()
                    .add(Expr::cust_with_values(
                        "external_number ILIKE $1",
                        [pattern.clone()],
                    ))
                    .add(Expr::cust_with_values("description ILIKE $1", [pattern])),
            );
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count invoices: {}", e)))?;

        let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let invoices = select
            .order_by_desc(invoice::Column::IssuedAt)
            .offset(offset)
            .limit(u64::from(limit))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query invoices: {}", e)))?;

        Ok((invoices, total))
    }
}
