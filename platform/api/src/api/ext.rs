use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use common::http::ext::{OptionExt, RequestGlobalExt, ResultExt};
use hyper::{Body, Request, StatusCode};
use routerify::prelude::RequestExt as _;
use serde::de::DeserializeOwned;
use ulid::Ulid;

use super::error::{ApiError, Result};
use super::request_context::RequestContext;
use crate::global::ApiGlobal;

pub trait RequestExt {
    fn get_global<G: ApiGlobal>(&self) -> Result<Arc<G>>;

    fn request_context(&self) -> Result<RequestContext>;

    fn query_params(&self) -> HashMap<String, String>;

    fn ulid_param(&self, name: &str) -> Result<Ulid>;
}

impl RequestExt for Request<Body> {
    #[track_caller]
    fn get_global<G: ApiGlobal>(&self) -> Result<Arc<G>> {
        <Self as RequestGlobalExt<ApiError>>::get_global::<G>(self)
    }

    fn request_context(&self) -> Result<RequestContext> {
        self.context::<RequestContext>()
            .map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "missing request context"))
    }

    /// The decoded query string, later duplicates win.
    fn query_params(&self) -> HashMap<String, String> {
        self.uri()
            .query()
            .map(|query| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    fn ulid_param(&self, name: &str) -> Result<Ulid> {
        self.param(name)
            .and_then(|value| Ulid::from_string(value).ok())
            .map_err_route((StatusCode::BAD_REQUEST, format!("invalid {name}")))
    }
}

/// Parses an optional query parameter, a present but malformed value is a 400.
pub fn parse_param<T: FromStr>(params: &HashMap<String, String>, name: &str) -> Result<Option<T>> {
    params
        .get(name)
        .map(|value| {
            value
                .parse()
                .map_ignore_err_route((StatusCode::BAD_REQUEST, format!("invalid {name}")))
        })
        .transpose()
}

pub async fn read_json<T: DeserializeOwned>(req: &mut Request<Body>) -> Result<T> {
    let body = hyper::body::to_bytes(req.body_mut())
        .await
        .map_err_route((StatusCode::BAD_REQUEST, "failed to read body"))?;

    serde_json::from_slice(&body).map_err_route((StatusCode::BAD_REQUEST, "invalid json body"))
}
