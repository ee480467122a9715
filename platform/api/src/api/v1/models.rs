use chrono::{DateTime, Utc};
use hyper::StatusCode;
use ulid::Ulid;

use crate::api::error::Result;
use crate::database::{InvalidReason, OwnerInfo, Pass, Scan, VisitorInfo};
use crate::pass::{self, PassUpdate, RegisterPass, Validation, MAX_NAME_LEN, MAX_PHONE_LEN};
use crate::scan::ScanOutcome;

/// Trims `value` and checks it is non empty and at most `max` characters.
fn check_field(field: &str, value: String, max: usize) -> Result<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{field} must not be empty")).into());
    }

    if value.chars().count() > max {
        return Err((StatusCode::BAD_REQUEST, format!("{field} must be at most {max} characters")).into());
    }

    Ok(value.to_string())
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(alias = "name")]
    pub visitor_name: String,
    #[serde(alias = "phone_number")]
    pub visitor_phone: String,
    pub duration_minutes: u32,
}

impl TryFrom<RegisterRequest> for RegisterPass {
    type Error = common::http::RouteError<crate::api::error::ApiError>;

    fn try_from(request: RegisterRequest) -> Result<Self> {
        Ok(Self {
            visitor_name: check_field("visitor_name", request.visitor_name, MAX_NAME_LEN)?,
            visitor_phone: check_field("visitor_phone", request.visitor_phone, MAX_PHONE_LEN)?,
            duration_minutes: request.duration_minutes,
        })
    }
}

/// Token fields and the validity window cannot be edited, only renewed.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRequest {
    #[serde(default, alias = "name")]
    pub visitor_name: Option<String>,
    #[serde(default, alias = "phone_number")]
    pub visitor_phone: Option<String>,
}

impl TryFrom<UpdateRequest> for PassUpdate {
    type Error = common::http::RouteError<crate::api::error::ApiError>;

    fn try_from(request: UpdateRequest) -> Result<Self> {
        Ok(Self {
            visitor_name: request
                .visitor_name
                .map(|name| check_field("visitor_name", name, MAX_NAME_LEN))
                .transpose()?,
            visitor_phone: request
                .visitor_phone
                .map(|phone| check_field("visitor_phone", phone, MAX_PHONE_LEN))
                .transpose()?,
        })
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PassResponse {
    pub id: Ulid,
    pub owner: OwnerInfo,
    pub visitor_name: String,
    pub visitor_phone: String,
    pub duration_minutes: u32,
    pub token_content: String,
    pub token_image: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl PassResponse {
    pub fn new(pass: Pass, now: DateTime<Utc>) -> Self {
        Self {
            active: pass::is_active(&pass, now),
            id: pass.id,
            owner: pass.owner,
            visitor_name: pass.visitor.name,
            visitor_phone: pass.visitor.phone,
            duration_minutes: pass.duration_minutes,
            token_content: pass.token_content,
            token_image: pass.token_image,
            issued_at: pass.issued_at,
            expires_at: pass.expires_at,
            created_at: pass.created_at,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_id: Option<Ulid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor: Option<VisitorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

fn invalid_message(reason: InvalidReason) -> &'static str {
    match reason {
        InvalidReason::NotFound => "pass not found",
        InvalidReason::Expired => "pass expired",
    }
}

impl From<Validation> for ValidationResponse {
    fn from(validation: Validation) -> Self {
        match validation {
            Validation::Valid(pass) => Self {
                valid: true,
                message: "pass is valid",
                reason: None,
                pass_id: Some(pass.id),
                owner: Some(pass.owner),
                visitor: Some(pass.visitor),
                issued_at: Some(pass.issued_at),
                expires_at: Some(pass.expires_at),
            },
            Validation::Invalid(reason) => Self {
                valid: false,
                message: invalid_message(reason),
                reason: Some(reason),
                pass_id: None,
                owner: None,
                visitor: None,
                issued_at: None,
                expires_at: None,
            },
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ShareResponse {
    pub share_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ScanRequest {
    #[serde(alias = "qr_data")]
    pub token: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct ConfirmRequest {
    pub scan_id: Ulid,
    pub confirmed: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct ScanResponse {
    pub scan_id: Ulid,
    #[serde(flatten)]
    pub validation: ValidationResponse,
}

impl From<ScanOutcome> for ScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        Self {
            scan_id: outcome.scan.id,
            validation: outcome.validation.into(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub message: &'static str,
    pub scan_id: Ulid,
}

impl ConfirmResponse {
    pub fn new(scan: &Scan) -> Self {
        Self {
            success: true,
            message: if scan.confirmed == Some(true) {
                "entry approved"
            } else {
                "entry denied"
            },
            scan_id: scan.id,
        }
    }
}

/// A history entry, flattened for the guard client.
#[derive(Debug, serde::Serialize)]
pub struct ScanRecord {
    pub id: Ulid,
    pub guard_id: Ulid,
    pub pass_id: Option<Ulid>,
    pub valid: bool,
    pub reason: Option<InvalidReason>,
    pub confirmed: Option<bool>,
    pub visitor_name: Option<String>,
    pub visitor_phone: Option<String>,
    pub resident_name: Option<String>,
    pub resident_phone: Option<String>,
    pub resident_apartment: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scanned_at: DateTime<Utc>,
}

impl From<Scan> for ScanRecord {
    fn from(scan: Scan) -> Self {
        let (visitor_name, visitor_phone) = match scan.visitor {
            Some(visitor) => (Some(visitor.name), Some(visitor.phone)),
            None => (None, None),
        };

        let (resident_name, resident_phone, resident_apartment) = match scan.owner {
            Some(owner) => (Some(owner.name), Some(owner.phone), Some(owner.apartment)),
            None => (None, None, None),
        };

        Self {
            id: scan.id,
            guard_id: scan.guard_id,
            pass_id: scan.pass_id,
            valid: scan.valid,
            reason: scan.reason,
            confirmed: scan.confirmed,
            visitor_name,
            visitor_phone,
            resident_name,
            resident_phone,
            resident_apartment,
            expires_at: scan.expires_at,
            scanned_at: scan.scanned_at,
        }
    }
}
