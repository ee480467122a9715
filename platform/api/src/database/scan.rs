use chrono::{DateTime, Utc};
use ulid::Ulid;
use uuid::Uuid;

use super::{InvalidReason, OwnerInfo, VisitorInfo};

/// A guard's scan of a pass QR code, with a snapshot of what the scan showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub id: Ulid,
    pub guard_id: Ulid,
    /// The pass the token resolved to, if any.
    pub pass_id: Option<Ulid>,
    pub valid: bool,
    pub reason: Option<InvalidReason>,
    /// `None` until the guard approves or denies entry.
    pub confirmed: Option<bool>,
    pub visitor: Option<VisitorInfo>,
    pub owner: Option<OwnerInfo>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCounts {
    pub total: u64,
    pub approved: u64,
    pub denied: u64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanRow {
    pub id: Uuid,
    pub guard_id: Uuid,
    pub pass_id: Option<Uuid>,
    pub valid: bool,
    pub reason: Option<String>,
    pub confirmed: Option<bool>,
    pub visitor_name: Option<String>,
    pub visitor_phone: Option<String>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub owner_apartment: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scanned_at: DateTime<Utc>,
}

impl From<ScanRow> for Scan {
    fn from(row: ScanRow) -> Self {
        let visitor = match (row.visitor_name, row.visitor_phone) {
            (Some(name), Some(phone)) => Some(VisitorInfo { name, phone }),
            _ => None,
        };

        let owner = match (row.owner_name, row.owner_phone, row.owner_apartment) {
            (Some(name), Some(phone), Some(apartment)) => Some(OwnerInfo { name, phone, apartment }),
            _ => None,
        };

        Self {
            id: row.id.into(),
            guard_id: row.guard_id.into(),
            pass_id: row.pass_id.map(Ulid::from),
            valid: row.valid,
            reason: row.reason.as_deref().and_then(InvalidReason::parse),
            confirmed: row.confirmed,
            visitor,
            owner,
            expires_at: row.expires_at,
            scanned_at: row.scanned_at,
        }
    }
}
