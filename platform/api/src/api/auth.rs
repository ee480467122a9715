use common::http::RouteError;
use hyper::StatusCode;
use ulid::Ulid;

use super::error::ApiError;
use super::jwt::IdentityClaims;
use crate::database::OwnerInfo;
use crate::pass::{self, Owner, MAX_APARTMENT_LEN, MAX_NAME_LEN, MAX_PHONE_LEN};
use crate::scan::Guard;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    Resident,
    Guard,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Guard => "guard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "resident" => Some(Self::Resident),
            "guard" => Some(Self::Guard),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum AuthError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("invalid token")]
    InvalidToken,
    #[error("this action requires the {} role", .0.as_str())]
    Forbidden(Role),
}

impl From<AuthError> for RouteError<ApiError> {
    #[track_caller]
    fn from(value: AuthError) -> Self {
        RouteError::from(match &value {
            AuthError::NotLoggedIn => (StatusCode::UNAUTHORIZED, "not logged in"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
            AuthError::Forbidden(Role::Resident) => (StatusCode::FORBIDDEN, "only residents can do this"),
            AuthError::Forbidden(Role::Guard) => (StatusCode::FORBIDDEN, "only guards can do this"),
        })
        .with_source(Some(ApiError::Auth(value)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
    pub user_id: Ulid,
    pub name: String,
    pub phone: String,
    pub apartment: String,
    pub role: Role,
}

impl From<IdentityClaims> for AuthData {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            user_id: claims.user_id,
            name: claims.name,
            phone: claims.phone,
            apartment: claims.apartment,
            role: claims.role,
        }
    }
}

impl AuthData {
    /// The caller as a pass owner. Identity fields are cut to the lengths a
    /// pass can hold.
    pub fn owner(&self) -> Result<Owner, AuthError> {
        if self.role != Role::Resident {
            return Err(AuthError::Forbidden(Role::Resident));
        }

        Ok(Owner {
            id: self.user_id,
            info: OwnerInfo {
                name: pass::truncate(&self.name, MAX_NAME_LEN),
                phone: pass::truncate(&self.phone, MAX_PHONE_LEN),
                apartment: pass::truncate(&self.apartment, MAX_APARTMENT_LEN),
            },
        })
    }

    pub fn guard(&self) -> Result<Guard, AuthError> {
        if self.role != Role::Guard {
            return Err(AuthError::Forbidden(Role::Guard));
        }

        Ok(Guard {
            id: self.user_id,
            name: self.name.clone(),
        })
    }
}
