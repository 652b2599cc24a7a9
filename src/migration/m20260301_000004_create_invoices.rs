//! Migration: Create invoices table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE invoices (
                    id BIGSERIAL PRIMARY KEY,
                    external_number VARCHAR(20) NOT NULL UNIQUE,
                    client_id BIGINT NOT NULL REFERENCES users(id),
                    -- Traceability only; the invoice survives job deletion
                    job_id BIGINT REFERENCES jobs(id) ON DELETE SET NULL,
                    amount DECIMAL(12, 2) NOT NULL,
                    currency VARCHAR(3) NOT NULL DEFAULT 'EUR',
                    description TEXT,
                    status VARCHAR(30) NOT NULL DEFAULT 'issued'
                        CHECK (status IN ('issued', 'pending_confirmation', 'paid')),
                    -- Client-reported payment details (audit hint)
                    payment_method VARCHAR(50),
                    payment_note TEXT,
                    issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    due_date DATE,
                    paid_at TIMESTAMPTZ,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_invoices_client_id ON invoices(client_id);
                CREATE INDEX idx_invoices_status ON invoices(status);
                CREATE INDEX idx_invoices_job_id ON invoices(job_id)
                    WHERE job_id IS NOT NULL;

                CREATE TRIGGER update_invoices_updated_at
                    BEFORE UPDATE ON invoices
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_invoices_updated_at ON invoices;
                DROP TABLE IF EXISTS invoices CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
