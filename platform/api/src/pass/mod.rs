use chrono::{DateTime, Duration, Utc};
use ulid::Ulid;

use self::content::TokenContent;
use self::image::EncodingError;
use crate::config::PassConfig;
use crate::database::{InvalidReason, OwnerInfo, Pass, VisitorInfo};
use crate::store::{PassStore, StoreError};

pub mod content;
pub mod image;
pub mod share;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 32;
pub const MAX_APARTMENT_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("a pass for this visitor already exists")]
    Conflict,
    #[error("pass not found")]
    NotFound,
    #[error("failed to encode token: {0}")]
    Encoding(#[from] EncodingError),
    #[error("invalid duration: {0} minutes")]
    InvalidDuration(u32),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for PassError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => Self::Conflict,
            err => Self::Store(err),
        }
    }
}

/// The authenticated resident acting on their passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: Ulid,
    pub info: OwnerInfo,
}

#[derive(Debug, Clone)]
pub struct RegisterPass {
    pub visitor_name: String,
    pub visitor_phone: String,
    pub duration_minutes: u32,
}

/// A partial edit, `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct PassUpdate {
    pub visitor_name: Option<String>,
    pub visitor_phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(Box<Pass>),
    Invalid(InvalidReason),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// A pass is active strictly before its expiry.
pub fn is_active(pass: &Pass, now: DateTime<Utc>) -> bool {
    now < pass.expires_at
}

/// Cuts `value` down to at most `max` characters.
pub fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

fn check_duration(config: &PassConfig, duration_minutes: u32) -> Result<(), PassError> {
    if duration_minutes == 0 || duration_minutes > config.max_duration_minutes {
        return Err(PassError::InvalidDuration(duration_minutes));
    }

    Ok(())
}

/// Re-renders the token content and image from the pass's current fields.
fn render(pass: &mut Pass) -> Result<(), PassError> {
    let content = TokenContent::new(&pass.owner, &pass.visitor, pass.duration_minutes).encode();
    pass.token_image = image::encode_base64_png(&content)?;
    pass.token_content = content;

    Ok(())
}

/// Regenerates the token of `pass` for `owner`, anchored at `now`.
fn generate(pass: &mut Pass, owner: &OwnerInfo, duration_minutes: u32, now: DateTime<Utc>) -> Result<(), PassError> {
    pass.owner = owner.clone();
    pass.duration_minutes = duration_minutes;
    render(pass)?;
    pass.issued_at = now;
    pass.expires_at = now + Duration::minutes(i64::from(duration_minutes));

    Ok(())
}

async fn owned_pass(store: &dyn PassStore, owner: &Owner, pass_id: Ulid) -> Result<Pass, PassError> {
    store
        .pass_by_id(pass_id)
        .await?
        .filter(|pass| pass.owner_id == owner.id)
        .ok_or(PassError::NotFound)
}

pub async fn register(
    store: &dyn PassStore,
    config: &PassConfig,
    owner: &Owner,
    request: RegisterPass,
    now: DateTime<Utc>,
) -> Result<Pass, PassError> {
    check_duration(config, request.duration_minutes)?;

    let mut pass = Pass {
        id: Ulid::new(),
        owner_id: owner.id,
        owner: owner.info.clone(),
        visitor: VisitorInfo {
            name: request.visitor_name,
            phone: request.visitor_phone,
        },
        duration_minutes: request.duration_minutes,
        token_content: String::new(),
        token_image: String::new(),
        issued_at: now,
        expires_at: now,
        created_at: now,
    };
    generate(&mut pass, &owner.info, request.duration_minutes, now)?;

    // The unique index on the visitor phone decides conflicts, lapsed passes included.
    store.insert_pass(&pass).await?;

    tracing::info!(pass_id = %pass.id, owner_id = %owner.id, expires_at = %pass.expires_at, "registered pass");

    Ok(pass)
}

/// Checks a token against the store. Unknown and expired tokens are reported
/// as data, only store failures are errors.
pub async fn validate(store: &dyn PassStore, token_content: &str, now: DateTime<Utc>) -> Result<Validation, StoreError> {
    let Some(pass) = store.pass_by_token(token_content).await? else {
        return Ok(Validation::Invalid(InvalidReason::NotFound));
    };

    if !is_active(&pass, now) {
        tracing::debug!(pass_id = %pass.id, expires_at = %pass.expires_at, "token expired");
        return Ok(Validation::Invalid(InvalidReason::Expired));
    }

    Ok(Validation::Valid(Box::new(pass)))
}

pub async fn renew(
    store: &dyn PassStore,
    config: &PassConfig,
    owner: &Owner,
    pass_id: Ulid,
    duration_minutes: u32,
    now: DateTime<Utc>,
) -> Result<Pass, PassError> {
    check_duration(config, duration_minutes)?;

    let mut pass = owned_pass(store, owner, pass_id).await?;
    generate(&mut pass, &owner.info, duration_minutes, now)?;

    if !store.update_pass(&pass).await? {
        return Err(PassError::NotFound);
    }

    tracing::info!(pass_id = %pass.id, owner_id = %owner.id, expires_at = %pass.expires_at, "renewed pass");

    Ok(pass)
}

/// Applies the present fields of `update`. A changed visitor re-renders the
/// token, the validity window only moves on renewal.
pub async fn update(store: &dyn PassStore, owner: &Owner, pass_id: Ulid, update: PassUpdate) -> Result<Pass, PassError> {
    let mut pass = owned_pass(store, owner, pass_id).await?;
    let visitor = pass.visitor.clone();

    if let Some(name) = update.visitor_name {
        pass.visitor.name = name;
    }

    if let Some(phone) = update.visitor_phone {
        pass.visitor.phone = phone;
    }

    if pass.visitor != visitor {
        render(&mut pass)?;
    }

    if !store.update_pass(&pass).await? {
        return Err(PassError::NotFound);
    }

    tracing::info!(pass_id = %pass.id, owner_id = %owner.id, "updated pass");

    Ok(pass)
}

pub async fn delete(store: &dyn PassStore, owner: &Owner, pass_id: Ulid) -> Result<(), PassError> {
    if !store.delete_pass(pass_id, owner.id).await? {
        return Err(PassError::NotFound);
    }

    tracing::info!(pass_id = %pass_id, owner_id = %owner.id, "deleted pass");

    Ok(())
}

pub async fn get(store: &dyn PassStore, owner: &Owner, pass_id: Ulid) -> Result<Pass, PassError> {
    owned_pass(store, owner, pass_id).await
}

pub async fn list(store: &dyn PassStore, owner: &Owner, page: Page) -> Result<Vec<Pass>, PassError> {
    Ok(store.passes_by_owner(owner.id, page.skip, page.limit).await?)
}
