//! Lot types and data structures.

use chrono::{DateTime, Utc};
use oplots_shared::types::{DocumentId, LotId, UserId};
use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Lot lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LotStatus {
    /// Created, not yet submitted.
    #[serde(rename = "draft")]
    Draft,
    /// Owner is composing the lot.
    #[serde(rename = "composing")]
    Composing,
    /// Registry is verifying the lot.
    #[serde(rename = "verification")]
    Verification,
    /// Verified, rectification period running.
    #[serde(rename = "pending")]
    Pending,
    /// Ready to be put up for auction.
    #[serde(rename = "active.salable")]
    ActiveSalable,
    /// Auction in progress.
    #[serde(rename = "active.auction")]
    ActiveAuction,
    /// Contracting with the winner.
    #[serde(rename = "active.contracting")]
    ActiveContracting,
    /// Sale awaiting confirmation.
    #[serde(rename = "pending.sold")]
    PendingSold,
    /// Dissolution awaiting confirmation.
    #[serde(rename = "pending.dissolution")]
    PendingDissolution,
    /// Sold.
    #[serde(rename = "sold")]
    Sold,
    /// Dissolved.
    #[serde(rename = "dissolved")]
    Dissolved,
    /// Deletion awaiting confirmation.
    #[serde(rename = "pending.deleted")]
    PendingDeleted,
    /// Deleted.
    #[serde(rename = "deleted")]
    Deleted,
    /// Rejected during verification.
    #[serde(rename = "invalid")]
    Invalid,
}

impl LotStatus {
    /// Statuses in which documents may be added or changed.
    pub const DOCUMENT_EDITABLE: [Self; 4] = [
        Self::Draft,
        Self::Composing,
        Self::Pending,
        Self::ActiveSalable,
    ];

    /// Convert to database string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Composing => "composing",
            Self::Verification => "verification",
            Self::Pending => "pending",
            Self::ActiveSalable => "active.salable",
            Self::ActiveAuction => "active.auction",
            Self::ActiveContracting => "active.contracting",
            Self::PendingSold => "pending.sold",
            Self::PendingDissolution => "pending.dissolution",
            Self::Sold => "sold",
            Self::Dissolved => "dissolved",
            Self::PendingDeleted => "pending.deleted",
            Self::Deleted => "deleted",
            Self::Invalid => "invalid",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "composing" => Some(Self::Composing),
            "verification" => Some(Self::Verification),
            "pending" => Some(Self::Pending),
            "active.salable" => Some(Self::ActiveSalable),
            "active.auction" => Some(Self::ActiveAuction),
            "active.contracting" => Some(Self::ActiveContracting),
            "pending.sold" => Some(Self::PendingSold),
            "pending.dissolution" => Some(Self::PendingDissolution),
            "sold" => Some(Self::Sold),
            "dissolved" => Some(Self::Dissolved),
            "pending.deleted" => Some(Self::PendingDeleted),
            "deleted" => Some(Self::Deleted),
            "invalid" => Some(Self::Invalid),
            _ => None,
        }
    }

    /// Whether documents may be added or changed in this status.
    #[must_use]
    pub fn allows_document_changes(&self) -> bool {
        Self::DOCUMENT_EDITABLE.contains(self)
    }
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time window with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// Start of the window.
    pub start_date: Option<DateTime<Utc>>,
    /// End of the window.
    pub end_date: Option<DateTime<Utc>>,
}

impl Period {
    /// Whether the window has an end that lies before `now`.
    #[must_use]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| end < now)
    }
}

/// Lot aggregate root.
#[derive(Debug, Clone)]
pub struct Lot {
    /// Unique identifier.
    pub id: LotId,
    /// Procedure type, `loki` for this registry.
    pub lot_type: String,
    /// Lifecycle status.
    pub status: LotStatus,
    /// Broker that owns the lot.
    pub owner_id: UserId,
    /// Rectification period, set once the lot is verified.
    pub rectification_period: Option<Period>,
    /// Last successful save.
    pub date_modified: DateTime<Utc>,
    /// Revision counter used for optimistic concurrency.
    pub rev: i32,
    /// Every document version, in insertion order.
    pub documents: Vec<Document>,
}

impl Lot {
    /// Procedure type served by this registry.
    pub const LOT_TYPE: &'static str = "loki";

    /// Create an empty lot owned by `owner_id`.
    #[must_use]
    pub fn new(owner_id: UserId, status: LotStatus) -> Self {
        Self {
            id: LotId::new(),
            lot_type: Self::LOT_TYPE.to_string(),
            status,
            owner_id,
            rectification_period: None,
            date_modified: Utc::now(),
            rev: 0,
            documents: Vec::new(),
        }
    }

    /// Whether the rectification period has ended at `now`.
    #[must_use]
    pub fn rectification_period_ended(&self, now: DateTime<Utc>) -> bool {
        self.rectification_period
            .is_some_and(|period| period.has_ended(now))
    }

    /// All versions of one document, oldest first.
    #[must_use]
    pub fn versions_of(&self, document_id: DocumentId) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|d| d.id == document_id)
            .collect()
    }

    /// Current (last appended) version of one document.
    #[must_use]
    pub fn latest_version(&self, document_id: DocumentId) -> Option<&Document> {
        self.documents.iter().rev().find(|d| d.id == document_id)
    }

    /// Mutable access to the current version of one document.
    pub fn latest_version_mut(&mut self, document_id: DocumentId) -> Option<&mut Document> {
        self.documents
            .iter_mut()
            .rev()
            .find(|d| d.id == document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case(LotStatus::Draft, true)]
    #[case(LotStatus::Composing, true)]
    #[case(LotStatus::Verification, false)]
    #[case(LotStatus::Pending, true)]
    #[case(LotStatus::ActiveSalable, true)]
    #[case(LotStatus::ActiveAuction, false)]
    #[case(LotStatus::Sold, false)]
    #[case(LotStatus::Deleted, false)]
    #[case(LotStatus::Invalid, false)]
    fn test_status_allows_document_changes(#[case] status: LotStatus, #[case] allowed: bool) {
        assert_eq!(status.allows_document_changes(), allowed);
    }

    #[test]
    fn test_status_roundtrip_and_serde_agree() {
        let statuses = [
            LotStatus::Draft,
            LotStatus::Composing,
            LotStatus::Verification,
            LotStatus::Pending,
            LotStatus::ActiveSalable,
            LotStatus::ActiveAuction,
            LotStatus::ActiveContracting,
            LotStatus::PendingSold,
            LotStatus::PendingDissolution,
            LotStatus::Sold,
            LotStatus::Dissolved,
            LotStatus::PendingDeleted,
            LotStatus::Deleted,
            LotStatus::Invalid,
        ];

        for status in statuses {
            assert_eq!(LotStatus::parse(status.as_str()), Some(status));
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::from(status.as_str()));
        }
        assert_eq!(LotStatus::parse("active"), None);
    }

    #[test]
    fn test_rectification_period_ended() {
        let now = Utc::now();
        let mut lot = Lot::new(UserId::new(), LotStatus::Pending);
        assert!(!lot.rectification_period_ended(now));

        lot.rectification_period = Some(Period {
            start_date: Some(now - Duration::days(2)),
            end_date: Some(now + Duration::days(1)),
        });
        assert!(!lot.rectification_period_ended(now));

        lot.rectification_period = Some(Period {
            start_date: Some(now - Duration::days(2)),
            end_date: Some(now - Duration::seconds(1)),
        });
        assert!(lot.rectification_period_ended(now));

        lot.rectification_period = Some(Period::default());
        assert!(!lot.rectification_period_ended(now));
    }
}
