//! `SeaORM` Entity for lot_documents table.
//!
//! One row per document version. `position` preserves the order of the
//! lot's document list.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "lot_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub lot_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub position: i32,
    pub document_id: Uuid,
    pub version_key: String,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub format: String,
    pub document_type: Option<String>,
    pub document_of: String,
    pub related_item: Option<String>,
    pub language: Option<String>,
    pub author: Option<String>,
    pub hash: String,
    pub storage_key: String,
    pub date_published: DateTimeWithTimeZone,
    pub date_modified: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lots::Entity",
        from = "Column::LotId",
        to = "super::lots::Column::Id"
    )]
    Lots,
}

impl Related<super::lots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
