//! `SeaORM` entity definitions.

pub mod lot_documents;
pub mod lots;

pub mod prelude {
    //! Entity re-exports.
    pub use super::lot_documents::Entity as LotDocuments;
    pub use super::lots::Entity as Lots;
}
