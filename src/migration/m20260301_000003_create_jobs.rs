//! Migration: Create jobs table.

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
                CREATE TABLE jobs (
                    id BIGSERIAL PRIMARY KEY,
                    -- Display id, allocated from the primary key inside the
                    -- creating transaction. Never null once the row commits.
                    external_number VARCHAR(20) NOT NULL UNIQUE,
                    client_id BIGINT NOT NULL REFERENCES users(id),
                    technician_id BIGINT REFERENCES users(id),
                    title VARCHAR(300) NOT NULL,
                    description TEXT,
                    status VARCHAR(20) NOT NULL DEFAULT 'waiting'
                        CHECK (status IN ('waiting', 'to_assign', 'assigned', 'in_progress', 'done', 'cancelled')),
                    -- Lower = more urgent
                    priority SMALLINT NOT NULL DEFAULT 3,
                    scheduled_date DATE,
                    address VARCHAR(500),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    completed_at TIMESTAMPTZ
                );

                CREATE INDEX idx_jobs_client_id ON jobs(client_id);
                CREATE INDEX idx_jobs_technician_id ON jobs(technician_id)
                    WHERE technician_id IS NOT NULL;
                CREATE INDEX idx_jobs_status ON jobs(status);

                CREATE TRIGGER update_jobs_updated_at
                    BEFORE UPDATE ON jobs
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
                DROP TRIGGER IF EXISTS update_jobs_updated_at ON jobs;
                DROP TABLE IF EXISTS jobs CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
