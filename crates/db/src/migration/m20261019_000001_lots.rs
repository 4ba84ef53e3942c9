//! Lots and lot document versions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LOTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS lot_documents CASCADE; DROP TABLE IF EXISTS lots CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const LOTS_SQL: &str = r"
-- Lot aggregate root
CREATE TABLE lots (
    id UUID PRIMARY KEY,
    lot_type VARCHAR(32) NOT NULL DEFAULT 'loki',
    status VARCHAR(32) NOT NULL,
    owner_id UUID NOT NULL,
    rectification_start_date TIMESTAMPTZ,
    rectification_end_date TIMESTAMPTZ,
    rev INTEGER NOT NULL DEFAULT 0,
    date_modified TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_lots_status CHECK (status IN (
        'draft', 'composing', 'verification', 'pending', 'active.salable',
        'active.auction', 'active.contracting', 'pending.sold', 'pending.dissolution',
        'sold', 'dissolved', 'pending.deleted', 'deleted', 'invalid'
    ))
);

CREATE INDEX idx_lots_owner ON lots(owner_id);

-- Every document version, ordered by position within its lot
CREATE TABLE lot_documents (
    lot_id UUID NOT NULL REFERENCES lots(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    document_id UUID NOT NULL,
    version_key VARCHAR(64) NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    format VARCHAR(255) NOT NULL,
    document_type VARCHAR(64),
    document_of VARCHAR(16) NOT NULL DEFAULT 'lot',
    related_item VARCHAR(64),
    language VARCHAR(16),
    author VARCHAR(32),
    hash VARCHAR(80) NOT NULL,
    storage_key TEXT NOT NULL,
    date_published TIMESTAMPTZ NOT NULL,
    date_modified TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (lot_id, position),
    CONSTRAINT uq_lot_documents_version UNIQUE (lot_id, document_id, version_key),
    CONSTRAINT chk_lot_documents_of CHECK (document_of IN ('lot', 'item'))
);

-- Versions of one document
CREATE INDEX idx_lot_documents_document ON lot_documents(lot_id, document_id);
";
