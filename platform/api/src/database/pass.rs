use chrono::{DateTime, Utc};
use ulid::Ulid;
use uuid::Uuid;

/// The resident a pass was issued for, as known when it was last generated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OwnerInfo {
    pub name: String,
    pub phone: String,
    pub apartment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VisitorInfo {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    /// The unique identifier for the pass.
    pub id: Ulid,
    /// The resident who registered the pass.
    pub owner_id: Ulid,
    pub owner: OwnerInfo,
    pub visitor: VisitorInfo,
    /// The duration used by the last (re)generation.
    pub duration_minutes: u32,
    /// The string encoded in the QR code.
    pub token_content: String,
    /// The QR code as a base64 encoded PNG.
    pub token_image: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Fixed at registration.
    pub created_at: DateTime<Utc>,
}

/// Why a token did not validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    NotFound,
    Expired,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_found" => Some(Self::NotFound),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PassRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_apartment: String,
    pub visitor_name: String,
    pub visitor_phone: String,
    pub duration_minutes: i32,
    pub token_content: String,
    pub token_image: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<PassRow> for Pass {
    fn from(row: PassRow) -> Self {
        Self {
            id: row.id.into(),
            owner_id: row.owner_id.into(),
            owner: OwnerInfo {
                name: row.owner_name,
                phone: row.owner_phone,
                apartment: row.owner_apartment,
            },
            visitor: VisitorInfo {
                name: row.visitor_name,
                phone: row.visitor_phone,
            },
            duration_minutes: row.duration_minutes.unsigned_abs(),
            token_content: row.token_content,
            token_image: row.token_image,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}
