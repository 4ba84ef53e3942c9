//! `SeaORM` Entity for lots table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "lots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub lot_type: String,
    pub status: String,
    pub owner_id: Uuid,
    pub rectification_start_date: Option<DateTimeWithTimeZone>,
    pub rectification_end_date: Option<DateTimeWithTimeZone>,
    pub rev: i32,
    pub date_modified: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::lot_documents::Entity")]
    LotDocuments,
}

impl Related<super::lot_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LotDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
