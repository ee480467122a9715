use std::sync::Arc;

use common::http::RouteError;
use hyper::http::header;
use hyper::Body;
use routerify::prelude::RequestExt;
use routerify::Middleware;

use crate::api::auth::AuthData;
use crate::api::error::ApiError;
use crate::api::ext::RequestExt as _;
use crate::api::jwt::{IdentityClaims, JwtState};
use crate::api::request_context::RequestContext;
use crate::global::ApiGlobal;

/// Attaches the caller's identity to the request context when a valid bearer
/// token is present. It never fails the request, routes that need an identity
/// reject it themselves.
pub fn auth_middleware<G: ApiGlobal>(_: &Arc<G>) -> Middleware<Body, RouteError<ApiError>> {
    Middleware::pre(|req| async move {
        let context = RequestContext::default();
        req.set_context(context.clone());

        let Some(token) = req.headers().get(header::AUTHORIZATION) else {
            // No Authorization header
            return Ok(req);
        };

        let global = req.get_global::<G>()?;

        // Tokens will start with "Bearer " so we need to remove that
        let claims = token
            .to_str()
            .ok()
            .and_then(|token| token.strip_prefix("Bearer "))
            .and_then(|token| IdentityClaims::verify(&global, token));

        match claims {
            Some(claims) => context.set_auth(AuthData::from(claims)).await,
            None => {
                tracing::debug!(path = %req.uri(), "rejected bearer token");
                context.set_invalid_token().await;
            }
        }

        Ok(req)
    })
}
