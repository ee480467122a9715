//! Read only links to a single pass, for residents forwarding a pass to
//! their visitor.
//!
//! A grant is tied to one generation of the pass: renewing or deleting the
//! pass, or letting it expire, invalidates every link handed out before.

use chrono::{DateTime, Utc};
use ulid::Ulid;

use super::{is_active, owned_pass, Owner, PassError};
use crate::database::Pass;
use crate::store::PassStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareGrant {
    pub pass_id: Ulid,
    /// `issued_at` of the shared pass, in epoch milliseconds.
    pub generation: i64,
    pub expires_at: DateTime<Utc>,
}

impl ShareGrant {
    fn for_pass(pass: &Pass) -> Self {
        Self {
            pass_id: pass.id,
            generation: pass.issued_at.timestamp_millis(),
            expires_at: pass.expires_at,
        }
    }
}

/// Grants read access to an active pass of `owner`.
pub async fn share(store: &dyn PassStore, owner: &Owner, pass_id: Ulid, now: DateTime<Utc>) -> Result<ShareGrant, PassError> {
    let pass = owned_pass(store, owner, pass_id).await?;

    if !is_active(&pass, now) {
        return Err(PassError::NotFound);
    }

    tracing::info!(pass_id = %pass.id, owner_id = %owner.id, "shared pass");

    Ok(ShareGrant::for_pass(&pass))
}

/// Loads the pass behind a grant, without owner scoping.
pub async fn resolve(store: &dyn PassStore, grant: &ShareGrant, now: DateTime<Utc>) -> Result<Pass, PassError> {
    let pass = store.pass_by_id(grant.pass_id).await?.ok_or(PassError::NotFound)?;

    if pass.issued_at.timestamp_millis() != grant.generation || !is_active(&pass, now) {
        return Err(PassError::NotFound);
    }

    Ok(pass)
}
