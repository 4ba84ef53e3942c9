//! Persistence seam for the lot aggregate.

use oplots_shared::types::LotId;

use super::types::Lot;
use crate::document::DocumentError;

/// Repository trait for lot persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait LotRepository: Send + Sync {
    /// Load a lot with all of its document versions.
    fn find_by_id(
        &self,
        id: LotId,
    ) -> impl std::future::Future<Output = Result<Option<Lot>, DocumentError>> + Send;

    /// Atomically persist the aggregate.
    ///
    /// Succeeds only if the stored revision still equals `lot.rev`; the
    /// returned lot carries the incremented revision. The document list is
    /// written exactly as given, in order.
    fn save_lot(
        &self,
        lot: &Lot,
    ) -> impl std::future::Future<Output = Result<Lot, DocumentError>> + Send;

    /// Insert a new lot.
    fn create(
        &self,
        lot: &Lot,
    ) -> impl std::future::Future<Output = Result<Lot, DocumentError>> + Send;
}
