use std::sync::Arc;

use chrono::Utc;
use common::http::{json_response, RouteError};
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;

use super::models::{ConfirmRequest, ConfirmResponse, ScanRecord, ScanRequest, ScanResponse};
use crate::api::error::{ApiError, Result};
use crate::api::ext::{parse_param, read_json, RequestExt};
use crate::global::ApiGlobal;
use crate::scan;

async fn scan_pass<G: ApiGlobal>(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let guard = req.request_context()?.guard().await?;

    let request = read_json::<ScanRequest>(&mut req).await?;

    let outcome = scan::scan(global.store(), &guard, &request.token, Utc::now()).await?;

    json_response(StatusCode::OK, &ScanResponse::from(outcome))
}

async fn confirm<G: ApiGlobal>(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let guard = req.request_context()?.guard().await?;

    let request = read_json::<ConfirmRequest>(&mut req).await?;

    let record = scan::confirm(global.store(), &guard, request.scan_id, request.confirmed).await?;

    json_response(StatusCode::OK, &ConfirmResponse::new(&record))
}

async fn history<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let guard = req.request_context()?.guard().await?;

    let limit = parse_param(&req.query_params(), "limit")?;

    let records = scan::history(global.store(), &guard, limit)
        .await?
        .into_iter()
        .map(ScanRecord::from)
        .collect::<Vec<_>>();

    json_response(StatusCode::OK, &records)
}

async fn stats<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let guard = req.request_context()?.guard().await?;

    let stats = scan::stats(global.store(), &guard, Utc::now()).await?;

    json_response(StatusCode::OK, &stats)
}

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> std::result::Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
    Router::builder()
        .post("/scan", scan_pass::<G>)
        .post("/confirm", confirm::<G>)
        .get("/history", history::<G>)
        .get("/stats", stats::<G>)
        .build()
}
