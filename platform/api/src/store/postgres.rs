use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool};
use sqlx::ConnectOptions;
use ulid::Ulid;
use uuid::Uuid;

use super::{PassStore, StoreError};
use crate::config::DatabaseConfig;
use crate::database::{Pass, PassRow, Scan, ScanCounts, ScanRow};

const PASS_COLUMNS: &str = "id, owner_id, owner_name, owner_phone, owner_apartment, visitor_name, visitor_phone, duration_minutes, token_content, token_image, issued_at, expires_at, created_at";

const SCAN_COLUMNS: &str = "id, guard_id, pass_id, valid, reason, confirmed, visitor_name, visitor_phone, owner_name, owner_phone, owner_apartment, expires_at, scanned_at";

pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = PgConnectOptions::from_str(&config.uri)?.disable_statement_logging();
        let db = PgPool::connect_with(options).await?;

        tracing::info!("connected to database");

        Ok(Self { db })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

fn map_write_err(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(db_err.constraint().unwrap_or("unique").to_string());
        }
    }

    StoreError::Database(err)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl PassStore for PgStore {
    async fn insert_pass(&self, pass: &Pass) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO passes ({PASS_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(Uuid::from(pass.id))
        .bind(Uuid::from(pass.owner_id))
        .bind(&pass.owner.name)
        .bind(&pass.owner.phone)
        .bind(&pass.owner.apartment)
        .bind(&pass.visitor.name)
        .bind(&pass.visitor.phone)
        .bind(pass.duration_minutes as i32)
        .bind(&pass.token_content)
        .bind(&pass.token_image)
        .bind(pass.issued_at)
        .bind(pass.expires_at)
        .bind(pass.created_at)
        .execute(&self.db)
        .await
        .map_err(map_write_err)?;

        Ok(())
    }

    async fn pass_by_id(&self, id: Ulid) -> Result<Option<Pass>, StoreError> {
        let row = sqlx::query_as::<_, PassRow>(&format!("SELECT {PASS_COLUMNS} FROM passes WHERE id = $1"))
            .bind(Uuid::from(id))
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(Pass::from))
    }

    async fn pass_by_token(&self, token_content: &str) -> Result<Option<Pass>, StoreError> {
        let row = sqlx::query_as::<_, PassRow>(&format!("SELECT {PASS_COLUMNS} FROM passes WHERE token_content = $1"))
            .bind(token_content)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(Pass::from))
    }

    async fn passes_by_owner(&self, owner_id: Ulid, skip: u64, limit: u64) -> Result<Vec<Pass>, StoreError> {
        let rows = sqlx::query_as::<_, PassRow>(&format!(
            "SELECT {PASS_COLUMNS} FROM passes WHERE owner_id = $1 ORDER BY created_at ASC, id ASC OFFSET $2 LIMIT $3"
        ))
        .bind(Uuid::from(owner_id))
        .bind(to_i64(skip))
        .bind(to_i64(limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Pass::from).collect())
    }

    async fn update_pass(&self, pass: &Pass) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE passes SET owner_name = $3, owner_phone = $4, owner_apartment = $5, visitor_name = $6, visitor_phone = $7, duration_minutes = $8, token_content = $9, token_image = $10, issued_at = $11, expires_at = $12 WHERE id = $1 AND owner_id = $2",
        )
        .bind(Uuid::from(pass.id))
        .bind(Uuid::from(pass.owner_id))
        .bind(&pass.owner.name)
        .bind(&pass.owner.phone)
        .bind(&pass.owner.apartment)
        .bind(&pass.visitor.name)
        .bind(&pass.visitor.phone)
        .bind(pass.duration_minutes as i32)
        .bind(&pass.token_content)
        .bind(&pass.token_image)
        .bind(pass.issued_at)
        .bind(pass.expires_at)
        .execute(&self.db)
        .await
        .map_err(map_write_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_pass(&self, id: Ulid, owner_id: Ulid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM passes WHERE id = $1 AND owner_id = $2")
            .bind(Uuid::from(id))
            .bind(Uuid::from(owner_id))
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_scan(&self, scan: &Scan) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO pass_scans ({SCAN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(Uuid::from(scan.id))
        .bind(Uuid::from(scan.guard_id))
        .bind(scan.pass_id.map(Uuid::from))
        .bind(scan.valid)
        .bind(scan.reason.map(|r| r.as_str()))
        .bind(scan.confirmed)
        .bind(scan.visitor.as_ref().map(|v| v.name.as_str()))
        .bind(scan.visitor.as_ref().map(|v| v.phone.as_str()))
        .bind(scan.owner.as_ref().map(|o| o.name.as_str()))
        .bind(scan.owner.as_ref().map(|o| o.phone.as_str()))
        .bind(scan.owner.as_ref().map(|o| o.apartment.as_str()))
        .bind(scan.expires_at)
        .bind(scan.scanned_at)
        .execute(&self.db)
        .await
        .map_err(map_write_err)?;

        Ok(())
    }

    async fn scan_by_id(&self, id: Ulid) -> Result<Option<Scan>, StoreError> {
        let row = sqlx::query_as::<_, ScanRow>(&format!("SELECT {SCAN_COLUMNS} FROM pass_scans WHERE id = $1"))
            .bind(Uuid::from(id))
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(Scan::from))
    }

    async fn update_scan(&self, scan: &Scan) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE pass_scans SET confirmed = $3 WHERE id = $1 AND guard_id = $2")
            .bind(Uuid::from(scan.id))
            .bind(Uuid::from(scan.guard_id))
            .bind(scan.confirmed)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn scans_by_guard(&self, guard_id: Ulid, limit: u64) -> Result<Vec<Scan>, StoreError> {
        let rows = sqlx::query_as::<_, ScanRow>(&format!(
            "SELECT {SCAN_COLUMNS} FROM pass_scans WHERE guard_id = $1 ORDER BY scanned_at DESC, id DESC LIMIT $2"
        ))
        .bind(Uuid::from(guard_id))
        .bind(to_i64(limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Scan::from).collect())
    }

    async fn scan_counts(&self, guard_id: Ulid, since: DateTime<Utc>) -> Result<ScanCounts, StoreError> {
        let (total, approved, denied): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE confirmed = TRUE), COUNT(*) FILTER (WHERE confirmed = FALSE) FROM pass_scans WHERE guard_id = $1 AND scanned_at >= $2",
        )
        .bind(Uuid::from(guard_id))
        .bind(since)
        .fetch_one(&self.db)
        .await?;

        Ok(ScanCounts {
            total: total.unsigned_abs(),
            approved: approved.unsigned_abs(),
            denied: denied.unsigned_abs(),
        })
    }
}
