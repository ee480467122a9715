use std::sync::Arc;

use common::http::{empty_response, RouteError};
use hyper::server::conn::Http;
use hyper::{Body, Request, Response, StatusCode};
use routerify::{RequestServiceBuilder, Router};
use tokio::net::TcpSocket;
use tokio::select;

use self::error::{ApiError, Result};
use crate::config::ApiConfig;
use crate::global::ApiGlobal;

pub mod auth;
mod error;
mod ext;
pub mod jwt;
mod middleware;
mod request_context;
pub mod v1;

async fn preflight(_: Request<Body>) -> Result<Response<Body>> {
    Ok(empty_response(StatusCode::NO_CONTENT))
}

async fn not_found(_: Request<Body>) -> Result<Response<Body>> {
    Err((StatusCode::NOT_FOUND, "not found").into())
}

pub fn routes<G: ApiGlobal>(global: &Arc<G>) -> std::result::Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
    let weak = Arc::downgrade(global);
    Router::builder()
        .data(weak)
        // The CORS middleware adds the CORS headers to the response
        .middleware(middleware::cors::cors_middleware(global))
        // The auth middleware checks the Authorization header, and if it's valid, it adds the user
        // to the request context. This does not fail the request if the token is invalid or not
        // present.
        .middleware(middleware::auth::auth_middleware(global))
        .err_handler_with_info(common::http::error_handler::<ApiError>)
        .scope("/v1", v1::routes(global)?)
        .options("/*", preflight)
        .any(not_found)
        .build()
}

pub async fn run<G: ApiGlobal>(global: Arc<G>) -> anyhow::Result<()> {
    let config = global.config::<ApiConfig>();
    tracing::info!("API listening on {}", config.bind_address);

    let socket = if config.bind_address.is_ipv6() {
        TcpSocket::new_v6()?
    } else {
        TcpSocket::new_v4()?
    };

    socket.set_reuseaddr(true)?;
    socket.set_reuseport(true)?;
    socket.bind(config.bind_address)?;
    let listener = socket.listen(1024)?;

    // The router only holds a Weak reference to the global state, so open
    // keep-alive connections do not keep it alive once shutdown starts.
    let router = routes(&global).map_err(|err| anyhow::anyhow!("failed to build router: {err}"))?;
    let request_service =
        RequestServiceBuilder::new(router).map_err(|err| anyhow::anyhow!("failed to build request service: {err}"))?;

    loop {
        select! {
            _ = global.ctx().done() => {
                return Ok(());
            },
            r = listener.accept() => {
                let (socket, addr) = r?;

                let service = request_service.build(addr);

                tracing::debug!("Accepted connection from {}", addr);

                tokio::spawn(async move {
                    Http::new().serve_connection(socket, service).with_upgrades().await.ok();
                });
            },
        }
    }
}
