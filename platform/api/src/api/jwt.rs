use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, RegisteredClaims, SignWithKey, Token, VerifyWithKey};
use serde_json::Value;
use sha2::Sha256;
use ulid::Ulid;

use super::auth::Role;
use crate::config::JwtConfig;
use crate::global::ApiGlobal;
use crate::pass::share::ShareGrant;

/// Audience of share tokens, identity tokens never carry one.
pub const SHARE_AUDIENCE: &str = "visitor-pass-share";

pub trait JwtState: Sized {
    fn to_claims(&self) -> Claims;

    fn from_claims(claims: &Claims) -> Option<Self>;

    fn serialize<G: ApiGlobal>(&self, global: &Arc<G>) -> Option<String> {
        let config = global.config::<JwtConfig>();

        let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
        let mut claims = self.to_claims();

        claims.registered.issuer = Some(config.issuer.clone());

        if claims.registered.issued_at.is_none() {
            claims.registered.issued_at = Some(Utc::now().timestamp() as u64);
        }

        claims.sign_with_key(&key).ok()
    }

    fn verify<G: ApiGlobal>(global: &Arc<G>, token: &str) -> Option<Self> {
        let config = global.config::<JwtConfig>();

        let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
        let token: Token<Header, Claims, _> = token.verify_with_key(&key).ok()?;

        let claims = token.claims();

        if claims.registered.issuer.as_ref() != Some(&config.issuer) {
            return None;
        }

        let now = Utc::now();

        let iat = timestamp(claims.registered.issued_at?)?;
        if iat > now {
            return None;
        }

        if let Some(nbf) = claims.registered.not_before.and_then(timestamp) {
            if nbf > now {
                return None;
            }
        }

        if let Some(exp) = claims.registered.expiration.and_then(timestamp) {
            if exp < now {
                return None;
            }
        }

        Self::from_claims(claims)
    }
}

fn timestamp(seconds: u64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(i64::try_from(seconds).ok()?, 0).single()
}

/// Who the identity provider says the caller is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub user_id: Ulid,
    pub name: String,
    pub phone: String,
    pub apartment: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub not_before: Option<DateTime<Utc>>,
    pub expiration: Option<DateTime<Utc>>,
}

fn private_str(claims: &Claims, key: &str) -> String {
    claims
        .private
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl JwtState for IdentityClaims {
    fn to_claims(&self) -> Claims {
        let mut claims = Claims::new(RegisteredClaims {
            issuer: None,
            subject: Some(self.user_id.to_string()),
            audience: None,
            expiration: self.expiration.map(|x| x.timestamp() as u64),
            not_before: self.not_before.map(|x| x.timestamp() as u64),
            issued_at: Some(self.issued_at.timestamp() as u64),
            json_web_token_id: None,
        });

        claims.private.insert("name".into(), self.name.clone().into());
        claims.private.insert("phone".into(), self.phone.clone().into());
        claims.private.insert("apartment".into(), self.apartment.clone().into());
        claims.private.insert("role".into(), self.role.as_str().into());

        claims
    }

    fn from_claims(claims: &Claims) -> Option<Self> {
        if claims.registered.audience.is_some() {
            return None;
        }

        let role = match claims.private.get("role") {
            Some(role) => Role::parse(role.as_str()?)?,
            None => Role::default(),
        };

        Some(Self {
            user_id: claims.registered.subject.as_ref().and_then(|x| Ulid::from_string(x).ok())?,
            name: private_str(claims, "name"),
            phone: private_str(claims, "phone"),
            apartment: private_str(claims, "apartment"),
            role,
            issued_at: timestamp(claims.registered.issued_at?)?,
            not_before: claims.registered.not_before.and_then(timestamp),
            expiration: claims.registered.expiration.and_then(timestamp),
        })
    }
}

/// A signed link to one generation of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareClaims {
    pub grant: ShareGrant,
    pub issued_at: DateTime<Utc>,
}

impl JwtState for ShareClaims {
    fn to_claims(&self) -> Claims {
        let mut claims = Claims::new(RegisteredClaims {
            issuer: None,
            subject: None,
            audience: Some(SHARE_AUDIENCE.to_string()),
            expiration: Some(self.grant.expires_at.timestamp() as u64),
            not_before: None,
            issued_at: Some(self.issued_at.timestamp() as u64),
            json_web_token_id: Some(self.grant.pass_id.to_string()),
        });

        claims.private.insert("generation".into(), self.grant.generation.into());

        claims
    }

    fn from_claims(claims: &Claims) -> Option<Self> {
        if claims.registered.audience.as_deref() != Some(SHARE_AUDIENCE) {
            return None;
        }

        Some(Self {
            grant: ShareGrant {
                pass_id: claims
                    .registered
                    .json_web_token_id
                    .as_ref()
                    .and_then(|x| Ulid::from_string(x).ok())?,
                generation: claims.private.get("generation").and_then(Value::as_i64)?,
                expires_at: timestamp(claims.registered.expiration?)?,
            },
            issued_at: timestamp(claims.registered.issued_at?)?,
        })
    }
}
