use std::sync::Arc;

use common::http::RouteError;
use hyper::Body;
use routerify::Router;

use super::error::ApiError;
use crate::global::ApiGlobal;

pub mod health;
pub mod models;
pub mod passes;
pub mod scans;

pub fn routes<G: ApiGlobal>(global: &Arc<G>) -> Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
    Router::builder()
        .scope("/health", health::routes(global)?)
        .scope("/passes", passes::routes(global)?)
        .scope("/scans", scans::routes(global)?)
        .build()
}
