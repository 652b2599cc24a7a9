//! Invoice domain models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Invoice payment status.
///
/// Strictly forward: issued -> pending_confirmation -> paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Issued by an admin, awaiting the client.
    Issued,
    /// Client reported a payment, awaiting admin confirmation.
    PendingConfirmation,
    /// Payment confirmed.
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::PendingConfirmation => "pending_confirmation",
            Self::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "issued" => Some(Self::Issued),
            "pending_confirmation" => Some(Self::PendingConfirmation),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Issued => 0,
            Self::PendingConfirmation => 1,
            Self::Paid => 2,
        }
    }

    /// Whether a payment-status change is permitted. Monotonic forward only;
    /// re-setting the current status is a no-op and allowed.
    pub fn can_transition(from: InvoiceStatus, to: InvoiceStatus) -> bool {
        to.rank() >= from.rank()
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to create an invoice (admin only).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateInvoiceRequest {
    pub client_id: Option<i64>,
    pub amount: Option<Decimal>,
    /// ISO 4217 code, defaults to EUR.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Optional traceability link to a job.
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Partial update of an invoice (admin only).
///
/// Status and paid_at move only through the dedicated payment operations.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PatchInvoiceRequest {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Client-reported payment details. Persisted as an audit hint.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReportPaymentRequest {
    /// Payment method, e.g. "bank_transfer".
    pub method: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Invoice representation returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: i64,
    /// Display identifier, e.g. "INV-2026-000007". Assigned once at creation.
    pub external_number: String,
    pub client_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    pub amount: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: InvoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_note: Option<String>,
    pub issued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::invoice::Model> for InvoiceResponse {
    fn from(m: crate::entity::invoice::Model) -> Self {
        let status = InvoiceStatus::parse(&m.status).unwrap_or(InvoiceStatus::Issued);
        Self {
            id: m.id,
            external_number: m.external_number,
            client_id: m.client_id,
            job_id: m.job_id,
            amount: m.amount,
            currency: m.currency,
            description: m.description,
            status,
            payment_method: m.payment_method,
            payment_note: m.payment_note,
            issued_at: m.issued_at,
            due_date: m.due_date,
            paid_at: m.paid_at,
            updated_at: m.updated_at,
        }
    }
}

/// Invoice list response with pagination.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Query parameters for listing invoices.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListInvoicesQuery {
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    /// Admin only; clients are already scoped to themselves.
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub job_id: Option<i64>,
    /// Free-text match against external_number and description.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    /// Clamped to 1..=200.
    #[serde(default)]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            InvoiceStatus::Issued,
            InvoiceStatus::PendingConfirmation,
            InvoiceStatus::Paid,
        ] {
            assert_eq!(InvoiceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(InvoiceStatus::parse("overdue"), None);
    }

    #[test]
    fn test_forward_only_transitions() {
        use InvoiceStatus::*;
        assert!(InvoiceStatus::can_transition(Issued, PendingConfirmation));
        assert!(InvoiceStatus::can_transition(PendingConfirmation, Paid));
        assert!(InvoiceStatus::can_transition(Issued, Paid));

        assert!(!InvoiceStatus::can_transition(Paid, Issued));
        assert!(!InvoiceStatus::can_transition(Paid, PendingConfirmation));
        assert!(!InvoiceStatus::can_transition(PendingConfirmation, Issued));
    }

    #[test]
    fn test_idempotent_same_state() {
        use InvoiceStatus::*;
        for status in [Issued, PendingConfirmation, Paid] {
            assert!(InvoiceStatus::can_transition(status, status));
        }
    }
}
