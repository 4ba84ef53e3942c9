//! Lot repository for database operations.
//!
//! Implements the lot aggregate persistence using SeaORM. The aggregate is
//! saved as a whole: the lot row is updated under an optimistic revision
//! check and its document rows are rewritten in order, all in one
//! transaction.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::{lot_documents, lots};
use oplots_core::document::{AuthenticatedRole, Document, DocumentError, DocumentOf, DocumentType};
use oplots_core::lot::{Lot, LotRepository as LotRepoTrait, LotStatus, Period};
use oplots_shared::types::{DocumentId, LotId, UserId};

/// Lot repository implementation.
#[derive(Debug, Clone)]
pub struct LotRepository {
    db: DatabaseConnection,
}

impl LotRepository {
    /// Create a new lot repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl LotRepoTrait for LotRepository {
    async fn find_by_id(&self, id: LotId) -> Result<Option<Lot>, DocumentError> {
        let Some(model) = lots::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let rows = lot_documents::Entity::find()
            .filter(lot_documents::Column::LotId.eq(model.id))
            .order_by_asc(lot_documents::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        to_domain(model, rows).map(Some)
    }

    async fn save_lot(&self, lot: &Lot) -> Result<Lot, DocumentError> {
        let now = Utc::now();
        let next_rev = lot.rev + 1;

        let txn = self.db.begin().await.map_err(db_err)?;

        let updated = lots::Entity::update_many()
            .col_expr(lots::Column::Status, Expr::value(lot.status.as_str()))
            .col_expr(
                lots::Column::RectificationStartDate,
                Expr::value(lot.rectification_period.and_then(|p| p.start_date).map(to_tz)),
            )
            .col_expr(
                lots::Column::RectificationEndDate,
                Expr::value(lot.rectification_period.and_then(|p| p.end_date).map(to_tz)),
            )
            .col_expr(lots::Column::Rev, Expr::value(next_rev))
            .col_expr(lots::Column::DateModified, Expr::value(to_tz(now)))
            .filter(lots::Column::Id.eq(lot.id.into_inner()))
            .filter(lots::Column::Rev.eq(lot.rev))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if updated.rows_affected == 0 {
            tracing::debug!(lot_id = %lot.id, rev = lot.rev, "stale lot revision");
            return Err(DocumentError::Conflict(lot.id));
        }

        write_documents(&txn, lot).await?;
        txn.commit().await.map_err(db_err)?;

        let mut saved = lot.clone();
        saved.rev = next_rev;
        saved.date_modified = now;
        Ok(saved)
    }

    async fn create(&self, lot: &Lot) -> Result<Lot, DocumentError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let now = to_tz(Utc::now());
        lots::ActiveModel {
            id: Set(lot.id.into_inner()),
            lot_type: Set(lot.lot_type.clone()),
            status: Set(lot.status.as_str().to_string()),
            owner_id: Set(lot.owner_id.into_inner()),
            rectification_start_date: Set(
                lot.rectification_period.and_then(|p| p.start_date).map(to_tz)
            ),
            rectification_end_date: Set(lot.rectification_period.and_then(|p| p.end_date).map(to_tz)),
            rev: Set(lot.rev),
            date_modified: Set(to_tz(lot.date_modified)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        write_documents(&txn, lot).await?;
        txn.commit().await.map_err(db_err)?;

        Ok(lot.clone())
    }
}

/// Replace the lot's document rows with `lot.documents`, in order.
async fn write_documents<C>(conn: &C, lot: &Lot) -> Result<(), DocumentError>
where
    C: sea_orm::ConnectionTrait,
{
    let rows = lot
        .documents
        .iter()
        .enumerate()
        .map(|(position, document)| to_active_model(lot.id, position, document))
        .collect::<Result<Vec<_>, _>>()?;

    lot_documents::Entity::delete_many()
        .filter(lot_documents::Column::LotId.eq(lot.id.into_inner()))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if rows.is_empty() {
        return Ok(());
    }

    lot_documents::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

fn to_active_model(
    lot_id: LotId,
    position: usize,
    d: &Document,
) -> Result<lot_documents::ActiveModel, DocumentError> {
    let position = i32::try_from(position).map_err(|_| {
        DocumentError::repository(format!("document position {position} out of range"))
    })?;

    Ok(lot_documents::ActiveModel {
        lot_id: Set(lot_id.into_inner()),
        position: Set(position),
        document_id: Set(d.id.into_inner()),
        version_key: Set(d.key.clone()),
        url: Set(d.url.clone()),
        title: Set(d.title.clone()),
        description: Set(d.description.clone()),
        format: Set(d.format.clone()),
        document_type: Set(d.document_type.map(|t| t.as_str().to_string())),
        document_of: Set(d.document_of.as_str().to_string()),
        related_item: Set(d.related_item.clone()),
        language: Set(d.language.clone()),
        author: Set(d.author.map(|a| a.as_str().to_string())),
        hash: Set(d.hash.clone()),
        storage_key: Set(d.storage_key.clone()),
        date_published: Set(to_tz(d.date_published)),
        date_modified: Set(to_tz(d.date_modified)),
    })
}

fn to_domain(model: lots::Model, rows: Vec<lot_documents::Model>) -> Result<Lot, DocumentError> {
    let status = LotStatus::parse(&model.status).ok_or_else(|| {
        DocumentError::repository(format!("unknown lot status '{}'", model.status))
    })?;

    let rectification_period = match (model.rectification_start_date, model.rectification_end_date) {
        (None, None) => None,
        (start, end) => Some(Period {
            start_date: start.map(to_utc),
            end_date: end.map(to_utc),
        }),
    };

    let documents = rows
        .into_iter()
        .map(document_to_domain)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Lot {
        id: LotId::from_uuid(model.id),
        lot_type: model.lot_type,
        status,
        owner_id: UserId::from_uuid(model.owner_id),
        rectification_period,
        date_modified: to_utc(model.date_modified),
        rev: model.rev,
        documents,
    })
}

fn document_to_domain(row: lot_documents::Model) -> Result<Document, DocumentError> {
    let document_type = row
        .document_type
        .as_deref()
        .map(|s| {
            DocumentType::parse(s)
                .ok_or_else(|| DocumentError::repository(format!("unknown document type '{s}'")))
        })
        .transpose()?;
    let document_of = DocumentOf::parse(&row.document_of).ok_or_else(|| {
        DocumentError::repository(format!("unknown documentOf '{}'", row.document_of))
    })?;
    let author = row
        .author
        .as_deref()
        .map(|s| {
            AuthenticatedRole::parse(s)
                .ok_or_else(|| DocumentError::repository(format!("unknown author role '{s}'")))
        })
        .transpose()?;

    Ok(Document {
        id: DocumentId::from_uuid(row.document_id),
        key: row.version_key,
        url: row.url,
        title: row.title,
        description: row.description,
        format: row.format,
        document_type,
        document_of,
        related_item: row.related_item,
        language: row.language,
        author,
        hash: row.hash,
        storage_key: row.storage_key,
        date_published: to_utc(row.date_published),
        date_modified: to_utc(row.date_modified),
    })
}

fn to_tz(value: DateTime<Utc>) -> sea_orm::prelude::DateTimeWithTimeZone {
    value.fixed_offset()
}

fn to_utc(value: sea_orm::prelude::DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

#[allow(clippy::needless_pass_by_value)]
fn db_err(e: DbErr) -> DocumentError {
    DocumentError::repository(e.to_string())
}
