use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::database::{Pass, Scan, ScanCounts};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write, carries the constraint name.
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Persistence for passes and guard scans.
///
/// Visitor phone numbers and token contents are unique across every pass, a
/// write that would break that fails with [`StoreError::Conflict`]. Owner
/// listings are ordered by `created_at` then `id`.
#[async_trait::async_trait]
pub trait PassStore: Send + Sync {
    async fn insert_pass(&self, pass: &Pass) -> Result<(), StoreError>;

    async fn pass_by_id(&self, id: Ulid) -> Result<Option<Pass>, StoreError>;

    async fn pass_by_token(&self, token_content: &str) -> Result<Option<Pass>, StoreError>;

    async fn passes_by_owner(&self, owner_id: Ulid, skip: u64, limit: u64) -> Result<Vec<Pass>, StoreError>;

    /// Overwrites the stored pass with the same id and owner. Returns false when
    /// there is no such pass.
    async fn update_pass(&self, pass: &Pass) -> Result<bool, StoreError>;

    /// Returns false when there is no pass with this id owned by `owner_id`.
    async fn delete_pass(&self, id: Ulid, owner_id: Ulid) -> Result<bool, StoreError>;

    async fn insert_scan(&self, scan: &Scan) -> Result<(), StoreError>;

    async fn scan_by_id(&self, id: Ulid) -> Result<Option<Scan>, StoreError>;

    async fn update_scan(&self, scan: &Scan) -> Result<bool, StoreError>;

    /// Newest first.
    async fn scans_by_guard(&self, guard_id: Ulid, limit: u64) -> Result<Vec<Scan>, StoreError>;

    async fn scan_counts(&self, guard_id: Ulid, since: DateTime<Utc>) -> Result<ScanCounts, StoreError>;
}
