//! Invoice entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display id, e.g. "INV-2026-000007". Set in the creating transaction.
    #[sea_orm(unique)]
    pub external_number: String,
    pub client_id: i64,
    /// Optional traceability link; invoices may exist independent of a job.
    pub job_id: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    /// issued, pending_confirmation, paid
    pub status: String,
    /// Client-reported payment details (audit hint).
    pub payment_method: Option<String>,
    pub payment_note: Option<String>,
    pub issued_at: DateTimeUtc,
    pub due_date: Option<Date>,
    pub paid_at: Option<DateTimeUtc>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ClientId",
        to = "super::user::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id",
        on_delete = "SetNull"
    )]
    Job,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
