use std::sync::Arc;

use chrono::Utc;
use common::http::ext::OptionExt;
use common::http::{empty_response, json_response, RouteError};
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;

use super::models::{PassResponse, RegisterRequest, ShareResponse, UpdateRequest, ValidationResponse};
use crate::api::error::{ApiError, Result};
use crate::api::ext::{parse_param, read_json, RequestExt};
use crate::api::jwt::{JwtState, ShareClaims};
use crate::config::PassConfig;
use crate::global::ApiGlobal;
use crate::pass::{self, share, Page, PassError, PassUpdate, RegisterPass};

async fn register<G: ApiGlobal>(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let owner = req.request_context()?.owner().await?;

    let request: RegisterPass = read_json::<RegisterRequest>(&mut req).await?.try_into()?;

    let now = Utc::now();
    let pass = pass::register(global.store(), global.config::<PassConfig>(), &owner, request, now).await?;

    json_response(StatusCode::CREATED, &PassResponse::new(pass, now))
}

async fn list<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let owner = req.request_context()?.owner().await?;

    let config = global.config::<PassConfig>();
    let params = req.query_params();
    let page = Page {
        skip: parse_param(&params, "skip")?.unwrap_or(0),
        limit: parse_param(&params, "limit")?
            .unwrap_or(u64::from(config.default_page_size))
            .min(u64::from(config.max_page_size)),
    };

    let now = Utc::now();
    let passes = pass::list(global.store(), &owner, page)
        .await?
        .into_iter()
        .map(|pass| PassResponse::new(pass, now))
        .collect::<Vec<_>>();

    json_response(StatusCode::OK, &passes)
}

/// Open to anyone holding a token. Unknown and expired tokens are still a 200.
async fn validate<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;

    let mut params = req.query_params();
    let token = params
        .remove("token")
        .or_else(|| params.remove("qr_data"))
        .map_err_route((StatusCode::BAD_REQUEST, "missing token"))?;

    let validation = pass::validate(global.store(), &token, Utc::now()).await?;

    json_response(StatusCode::OK, &ValidationResponse::from(validation))
}

async fn get_one<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let owner = req.request_context()?.owner().await?;
    let pass_id = req.ulid_param("id")?;

    let pass = pass::get(global.store(), &owner, pass_id).await?;

    json_response(StatusCode::OK, &PassResponse::new(pass, Utc::now()))
}

async fn update<G: ApiGlobal>(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let owner = req.request_context()?.owner().await?;
    let pass_id = req.ulid_param("id")?;

    let update: PassUpdate = read_json::<UpdateRequest>(&mut req).await?.try_into()?;

    let pass = pass::update(global.store(), &owner, pass_id, update).await?;

    json_response(StatusCode::OK, &PassResponse::new(pass, Utc::now()))
}

async fn delete<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let owner = req.request_context()?.owner().await?;
    let pass_id = req.ulid_param("id")?;

    pass::delete(global.store(), &owner, pass_id).await?;

    Ok(empty_response(StatusCode::NO_CONTENT))
}

async fn renew<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let owner = req.request_context()?.owner().await?;
    let pass_id = req.ulid_param("id")?;

    let duration_minutes = parse_param::<u32>(&req.query_params(), "duration_minutes")?
        .map_err_route((StatusCode::BAD_REQUEST, "missing duration_minutes"))?;

    let now = Utc::now();
    let pass = pass::renew(
        global.store(),
        global.config::<PassConfig>(),
        &owner,
        pass_id,
        duration_minutes,
        now,
    )
    .await?;

    json_response(StatusCode::OK, &PassResponse::new(pass, now))
}

async fn share_pass<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;
    let owner = req.request_context()?.owner().await?;
    let pass_id = req.ulid_param("id")?;

    let now = Utc::now();
    let grant = share::share(global.store(), &owner, pass_id, now).await?;

    let share_token = ShareClaims { grant, issued_at: now }
        .serialize(&global)
        .map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to sign share token"))?;

    json_response(
        StatusCode::OK,
        &ShareResponse {
            share_token,
            expires_at: grant.expires_at,
        },
    )
}

async fn shared_pass<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<G>()?;

    let token = req
        .query_params()
        .remove("token")
        .map_err_route((StatusCode::BAD_REQUEST, "missing token"))?;

    let claims = ShareClaims::verify(&global, &token).ok_or(PassError::NotFound)?;

    let now = Utc::now();
    let pass = share::resolve(global.store(), &claims.grant, now).await?;

    json_response(StatusCode::OK, &PassResponse::new(pass, now))
}

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> std::result::Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
    Router::builder()
        .post("/register", register::<G>)
        .get("/list", list::<G>)
        .get("/validate", validate::<G>)
        .get("/shared", shared_pass::<G>)
        .get("/one/:id", get_one::<G>)
        .put("/:id", update::<G>)
        .delete("/:id", delete::<G>)
        .post("/:id/renew", renew::<G>)
        .post("/:id/share", share_pass::<G>)
        .build()
}
