use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::auth::{AuthData, AuthError};
use crate::pass::Owner;
use crate::scan::Guard;

#[derive(Default, Clone)]
pub struct ContextData {
    pub auth: Option<AuthData>,
    /// A bearer token was sent but did not verify.
    pub invalid_token: bool,
}

#[derive(Default, Clone)]
pub struct RequestContext(Arc<RwLock<ContextData>>);

impl RequestContext {
    pub async fn set_auth(&self, data: AuthData) {
        let mut guard = self.0.write().await;
        guard.auth = Some(data);
        guard.invalid_token = false;
    }

    pub async fn set_invalid_token(&self) {
        let mut guard = self.0.write().await;
        guard.auth = None;
        guard.invalid_token = true;
    }

    pub async fn auth(&self) -> Result<AuthData, AuthError> {
        let inner = self.0.read().await.deref().clone();
        match inner.auth {
            Some(auth) => Ok(auth),
            None if inner.invalid_token => Err(AuthError::InvalidToken),
            None => Err(AuthError::NotLoggedIn),
        }
    }

    pub async fn owner(&self) -> Result<Owner, AuthError> {
        self.auth().await?.owner()
    }

    pub async fn guard(&self) -> Result<Guard, AuthError> {
        self.auth().await?.guard()
    }
}
