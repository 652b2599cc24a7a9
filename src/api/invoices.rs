//! Invoice API endpoints.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use rust_decimal::Decimal;

use crate::auth::ActorAuth;
use crate::db::{DbPool, invoices::NewInvoice};
use crate::error::{AppError, AppResult};
use crate::models::{
    ActorContext, CreateInvoiceRequest, InvoiceListResponse, InvoiceResponse, InvoiceStatus,
    ListInvoicesQuery, PatchInvoiceRequest, ReportPaymentRequest, Role, normalize_page,
};

/// Configure invoice routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_invoice)
        .service(list_invoices)
        .service(report_payment)
        .service(confirm_payment)
        .service(get_invoice)
        .service(patch_invoice)
        .service(delete_invoice);
}

/// Whether the actor may read this invoice. Technicians have no invoice
/// surface at all.
fn can_view_invoice(actor: &ActorContext, client_id: i64) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Client => client_id == actor.id,
        Role::Technician => false,
    }
}

/// Create an invoice (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    tag = "Invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = InvoiceResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[post("/invoices")]
pub async fn create_invoice(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    body: web::Json<CreateInvoiceRequest>,
) -> AppResult<HttpResponse> {
    if !auth.actor.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can create invoices".to_string(),
        ));
    }

    let req = body.into_inner();
    let client_id = req
        .client_id
        .ok_or_else(|| AppError::InvalidInput("client_id is required".to_string()))?;
    let amount = req
        .amount
        .ok_or_else(|| AppError::InvalidInput("amount is required".to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidInput("amount must be positive".to_string()));
    }

    pool.get_user_with_role(client_id, Role::Client).await?;

    if let Some(job_id) = req.job_id {
        pool.get_job_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;
    }

    let invoice = pool
        .insert_invoice(NewInvoice {
            client_id,
            job_id: req.job_id,
            amount,
            currency: req.currency.unwrap_or_else(|| "EUR".to_string()),
            description: req.description,
            due_date: req.due_date,
        })
        .await?;

    Ok(HttpResponse::Created().json(InvoiceResponse::from(invoice)))
}

/// List invoices visible to the actor.
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    tag = "Invoices",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("client_id" = Option<i64>, Query, description = "Filter by client (admin)"),
        ("job_id" = Option<i64>, Query, description = "Filter by linked job"),
        ("q" = Option<String>, Query, description = "Free-text match on number/description"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 50, max: 200)")
    ),
    responses(
        (status = 200, description = "List of invoices", body = InvoiceListResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[get("/invoices")]
pub async fn list_invoices(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    query: web::Query<ListInvoicesQuery>,
) -> AppResult<HttpResponse> {
    if auth.actor.is_technician() {
        return Err(AppError::Forbidden(
            "Technicians have no access to invoices".to_string(),
        ));
    }

    let (page, limit) = normalize_page(query.page, query.limit);
    let (invoices, total) = pool
        .query_invoices(&auth.actor, &query, page, limit)
        .await?;

    Ok(HttpResponse::Ok().json(InvoiceListResponse {
        invoices: invoices.into_iter().map(InvoiceResponse::from).collect(),
        total,
        page,
        limit,
    }))
}

/// Get an invoice by ID.
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    tag = "Invoices",
    params(("id" = i64, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice details", body = InvoiceResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[get("/invoices/{id}")]
pub async fn get_invoice(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let invoice = pool
        .get_invoice_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;

    if !can_view_invoice(&auth.actor, invoice.client_id) {
        return Err(AppError::Forbidden("No access to this invoice".to_string()));
    }

    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// Patch invoice fields (admin only).
///
/// Status and paid_at move only through the dedicated payment operations.
#[utoipa::path(
    patch,
    path = "/api/v1/invoices/{id}",
    tag = "Invoices",
    params(("id" = i64, Path, description = "Invoice ID")),
    request_body = PatchInvoiceRequest,
    responses(
        (status = 200, description = "Updated invoice", body = InvoiceResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[patch("/invoices/{id}")]
pub async fn patch_invoice(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
    body: web::Json<PatchInvoiceRequest>,
) -> AppResult<HttpResponse> {
    if !auth.actor.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can modify invoices".to_string(),
        ));
    }

    let patch = body.into_inner();
    if let Some(amount) = patch.amount
        && amount <= Decimal::ZERO
    {
        return Err(AppError::InvalidInput("amount must be positive".to_string()));
    }

    let id = path.into_inner();
    let invoice = pool
        .get_invoice_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;

    if let Some(job_id) = patch.job_id {
        pool.get_job_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;
    }

    let updated = pool.patch_invoice(invoice, &patch).await?;
    Ok(HttpResponse::Ok().json(InvoiceResponse::from(updated)))
}

/// Delete an invoice (admin only).
#[utoipa::path(
    delete,
    path = "/api/v1/invoices/{id}",
    tag = "Invoices",
    params(("id" = i64, Path, description = "Invoice ID")),
    responses(
        (status = 204, description = "Invoice deleted"),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[delete("/invoices/{id}")]
pub async fn delete_invoice(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    if !auth.actor.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete invoices".to_string(),
        ));
    }

    let id = path.into_inner();
    if !pool.delete_invoice(id).await? {
        return Err(AppError::NotFound(format!("Invoice {}", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Report a payment on an invoice (owning client only).
///
/// Legal only from `issued`; moves the invoice to `pending_confirmation` and
/// records the reported method and note for the confirming admin.
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/report-payment",
    tag = "Invoices",
    params(("id" = i64, Path, description = "Invoice ID")),
    request_body = ReportPaymentRequest,
    responses(
        (status = 200, description = "Payment reported", body = InvoiceResponse),
        (status = 400, description = "Missing payment method", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Invoice is not in issued state", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[post("/invoices/{id}/report-payment")]
pub async fn report_payment(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
    body: web::Json<ReportPaymentRequest>,
) -> AppResult<HttpResponse> {
    if !auth.actor.is_client() {
        return Err(AppError::Forbidden(
            "Only the invoiced client can report a payment".to_string(),
        ));
    }

    let req = body.into_inner();
    let method = req
        .method
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("method is required".to_string()))?;

    let id = path.into_inner();
    let invoice = pool
        .get_invoice_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;

    if invoice.client_id != auth.actor.id {
        return Err(AppError::Forbidden("No access to this invoice".to_string()));
    }

    let current = InvoiceStatus::parse(&invoice.status).unwrap_or(InvoiceStatus::Issued);
    if current != InvoiceStatus::Issued {
        return Err(AppError::Conflict(format!(
            "Payment can only be reported on an issued invoice (currently '{}')",
            current
        )));
    }

    let updated = pool.set_payment_reported(invoice, method, req.note).await?;
    Ok(HttpResponse::Ok().json(InvoiceResponse::from(updated)))
}

/// Confirm a reported payment (admin only).
///
/// Idempotent: confirming an already paid invoice returns it unchanged with
/// the original paid_at. Confirming an invoice still in `issued` is a
/// conflict; the client has not reported a payment yet.
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/confirm-payment",
    tag = "Invoices",
    params(("id" = i64, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Payment confirmed", body = InvoiceResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::error::ErrorResponse),
        (status = 409, description = "No reported payment to confirm", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[post("/invoices/{id}/confirm-payment")]
pub async fn confirm_payment(
    pool: web::Data<DbPool>,
    auth: ActorAuth,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    if !auth.actor.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can confirm payments".to_string(),
        ));
    }

    let id = path.into_inner();
    let invoice = pool
        .get_invoice_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;

    let current = InvoiceStatus::parse(&invoice.status).unwrap_or(InvoiceStatus::Issued);
    match current {
        InvoiceStatus::Paid => Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice))),
        InvoiceStatus::PendingConfirmation => {
            let updated = pool.set_paid(invoice).await?;
            Ok(HttpResponse::Ok().json(InvoiceResponse::from(updated)))
        }
        InvoiceStatus::Issued => Err(AppError::Conflict(
            "No reported payment to confirm".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_view_scoping() {
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

        assert!(can_view_invoice(&admin, 10));
        assert!(can_view_invoice(&client, 10));
        assert!(!can_view_invoice(&client, 11));
        assert!(!can_view_invoice(&tech, 10));
        assert!(!can_view_invoice(&tech, 20));
    }
}
