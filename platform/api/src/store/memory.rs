use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use ulid::Ulid;

use super::{PassStore, StoreError};
use crate::database::{Pass, Scan, ScanCounts};

const VISITOR_PHONE_KEY: &str = "passes_visitor_phone_key";
const TOKEN_CONTENT_KEY: &str = "passes_token_content_key";
const PASS_ID_KEY: &str = "passes_pkey";
const SCAN_ID_KEY: &str = "pass_scans_pkey";

#[derive(Default)]
struct Inner {
    passes: HashMap<Ulid, Pass>,
    scans: HashMap<Ulid, Scan>,
}

impl Inner {
    /// Finds the constraint `pass` would violate if written next to every
    /// other stored pass.
    fn conflict(&self, pass: &Pass) -> Option<&'static str> {
        self.passes.values().filter(|other| other.id != pass.id).find_map(|other| {
            if other.visitor.phone == pass.visitor.phone {
                Some(VISITOR_PHONE_KEY)
            } else if other.token_content == pass.token_content {
                Some(TOKEN_CONTENT_KEY)
            } else {
                None
            }
        })
    }
}

/// A [`PassStore`] that lives in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PassStore for MemoryStore {
    async fn insert_pass(&self, pass: &Pass) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if inner.passes.contains_key(&pass.id) {
            return Err(StoreError::Conflict(PASS_ID_KEY.to_string()));
        }

        if let Some(constraint) = inner.conflict(pass) {
            return Err(StoreError::Conflict(constraint.to_string()));
        }

        inner.passes.insert(pass.id, pass.clone());
        Ok(())
    }

    async fn pass_by_id(&self, id: Ulid) -> Result<Option<Pass>, StoreError> {
        Ok(self.inner.read().await.passes.get(&id).cloned())
    }

    async fn pass_by_token(&self, token_content: &str) -> Result<Option<Pass>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .passes
            .values()
            .find(|pass| pass.token_content == token_content)
            .cloned())
    }

    async fn passes_by_owner(&self, owner_id: Ulid, skip: u64, limit: u64) -> Result<Vec<Pass>, StoreError> {
        let inner = self.inner.read().await;

        let mut passes = inner
            .passes
            .values()
            .filter(|pass| pass.owner_id == owner_id)
            .collect::<Vec<_>>();
        passes.sort_by_key(|pass| (pass.created_at, pass.id));

        Ok(passes
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn update_pass(&self, pass: &Pass) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;

        if !inner
            .passes
            .get(&pass.id)
            .is_some_and(|stored| stored.owner_id == pass.owner_id)
        {
            return Ok(false);
        }

        if let Some(constraint) = inner.conflict(pass) {
            return Err(StoreError::Conflict(constraint.to_string()));
        }

        // Same as the row update, `created_at` is never rewritten.
        let created_at = inner.passes.get(&pass.id).map(|stored| stored.created_at);
        let mut pass = pass.clone();
        if let Some(created_at) = created_at {
            pass.created_at = created_at;
        }

        inner.passes.insert(pass.id, pass);
        Ok(true)
    }

    async fn delete_pass(&self, id: Ulid, owner_id: Ulid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;

        if !inner.passes.get(&id).is_some_and(|pass| pass.owner_id == owner_id) {
            return Ok(false);
        }

        Ok(inner.passes.remove(&id).is_some())
    }

    async fn insert_scan(&self, scan: &Scan) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if inner.scans.contains_key(&scan.id) {
            return Err(StoreError::Conflict(SCAN_ID_KEY.to_string()));
        }

        inner.scans.insert(scan.id, scan.clone());
        Ok(())
    }

    async fn scan_by_id(&self, id: Ulid) -> Result<Option<Scan>, StoreError> {
        Ok(self.inner.read().await.scans.get(&id).cloned())
    }

    async fn update_scan(&self, scan: &Scan) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;

        match inner.scans.get_mut(&scan.id) {
            Some(stored) if stored.guard_id == scan.guard_id => {
                stored.confirmed = scan.confirmed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn scans_by_guard(&self, guard_id: Ulid, limit: u64) -> Result<Vec<Scan>, StoreError> {
        let inner = self.inner.read().await;

        let mut scans = inner
            .scans
            .values()
            .filter(|scan| scan.guard_id == guard_id)
            .collect::<Vec<_>>();
        scans.sort_by_key(|scan| std::cmp::Reverse((scan.scanned_at, scan.id)));

        Ok(scans
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn scan_counts(&self, guard_id: Ulid, since: DateTime<Utc>) -> Result<ScanCounts, StoreError> {
        let inner = self.inner.read().await;

        Ok(inner
            .scans
            .values()
            .filter(|scan| scan.guard_id == guard_id && scan.scanned_at >= since)
            .fold(ScanCounts::default(), |mut counts, scan| {
                counts.total += 1;
                match scan.confirmed {
                    Some(true) => counts.approved += 1,
                    Some(false) => counts.denied += 1,
                    None => {}
                }
                counts
            }))
    }
}
