use chrono::{DateTime, TimeZone, Utc};
use ulid::Ulid;

use crate::database::Scan;
use crate::pass::content::TokenContent;
use crate::pass::{self, Validation};
use crate::store::{PassStore, StoreError};

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;
pub const MAX_HISTORY_LIMIT: u64 = 200;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan not found")]
    NotFound,
    #[error("cannot approve entry on an invalid pass")]
    InvalidPass,
    #[error("scan has already been confirmed")]
    AlreadyConfirmed,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The authenticated guard at the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub id: Ulid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub scan: Scan,
    pub validation: Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScanStats {
    pub today_scans: u64,
    pub today_approved: u64,
    pub today_denied: u64,
    pub guard_name: String,
}

/// Validates a scanned token and records the scan.
///
/// Tokens that do not validate still get a record, with whatever identity the
/// token itself carries.
pub async fn scan(store: &dyn PassStore, guard: &Guard, token_content: &str, now: DateTime<Utc>) -> Result<ScanOutcome, StoreError> {
    let validation = pass::validate(store, token_content, now).await?;

    let record = match &validation {
        Validation::Valid(pass) => Scan {
            id: Ulid::new(),
            guard_id: guard.id,
            pass_id: Some(pass.id),
            valid: true,
            reason: None,
            confirmed: None,
            visitor: Some(pass.visitor.clone()),
            owner: Some(pass.owner.clone()),
            expires_at: Some(pass.expires_at),
            scanned_at: now,
        },
        Validation::Invalid(reason) => {
            let content = TokenContent::decode(token_content);
            Scan {
                id: Ulid::new(),
                guard_id: guard.id,
                pass_id: None,
                valid: false,
                reason: Some(*reason),
                confirmed: None,
                visitor: content.as_ref().map(|c| c.visitor.clone()),
                owner: content.map(|c| c.resident),
                expires_at: None,
                scanned_at: now,
            }
        }
    };

    store.insert_scan(&record).await?;

    tracing::info!(scan_id = %record.id, guard_id = %guard.id, valid = record.valid, "recorded scan");

    Ok(ScanOutcome {
        scan: record,
        validation,
    })
}

/// Records whether the guard let the visitor in. Each scan is decided once.
pub async fn confirm(store: &dyn PassStore, guard: &Guard, scan_id: Ulid, confirmed: bool) -> Result<Scan, ScanError> {
    let mut record = store
        .scan_by_id(scan_id)
        .await?
        .filter(|scan| scan.guard_id == guard.id)
        .ok_or(ScanError::NotFound)?;

    if record.confirmed.is_some() {
        return Err(ScanError::AlreadyConfirmed);
    }

    if confirmed && !record.valid {
        return Err(ScanError::InvalidPass);
    }

    record.confirmed = Some(confirmed);
    if !store.update_scan(&record).await? {
        return Err(ScanError::NotFound);
    }

    tracing::info!(scan_id = %record.id, guard_id = %guard.id, confirmed, "confirmed scan");

    Ok(record)
}

/// The guard's most recent scans, newest first.
pub async fn history(store: &dyn PassStore, guard: &Guard, limit: Option<u64>) -> Result<Vec<Scan>, StoreError> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    store.scans_by_guard(guard.id, limit).await
}

/// Counts the guard's scans since midnight UTC.
pub async fn stats(store: &dyn PassStore, guard: &Guard, now: DateTime<Utc>) -> Result<ScanStats, StoreError> {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .unwrap_or(now);

    let counts = store.scan_counts(guard.id, midnight).await?;

    Ok(ScanStats {
        today_scans: counts.total,
        today_approved: counts.approved,
        today_denied: counts.denied,
        guard_name: guard.name.clone(),
    })
}
