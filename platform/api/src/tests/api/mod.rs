use std::sync::Arc;
use std::time::Duration;

use common::context::Handler;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::api;
use crate::config::{ApiConfig, AppConfig};
use crate::global::GlobalState;
use crate::tests::global::mock_global_state;

mod health;
mod passes;
mod scans;
mod share;

pub struct TestApi {
    pub global: Arc<GlobalState>,
    pub client: reqwest::Client,
    handler: Handler,
    handle: JoinHandle<anyhow::Result<()>>,
    port: u16,
}

impl TestApi {
    pub async fn start() -> Self {
        let port = portpicker::pick_unused_port().expect("failed to pick port");
        let (global, handler) = mock_global_state(AppConfig {
            api: ApiConfig {
                bind_address: format!("127.0.0.1:{}", port).parse().unwrap(),
            },
            ..Default::default()
        });

        let handle = tokio::spawn(api::run(global.clone()));

        // We need to wait for the server to start
        tokio::time::sleep(Duration::from_millis(300)).await;

        Self {
            global,
            client: reqwest::Client::new(),
            handler,
            handle,
            port,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://localhost:{}/v1{}", self.port, path)
    }

    pub async fn shutdown(self) {
        // The client uses Keep-Alive, so we need to drop it to release the global context
        drop(self.global);
        drop(self.client);

        tokio::time::timeout(Duration::from_secs(1), self.handler.cancel())
            .await
            .expect("failed to cancel context");

        tokio::time::timeout(Duration::from_secs(1), self.handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}

pub async fn send(request: RequestBuilder) -> (reqwest::StatusCode, Value) {
    let resp: Response = request.send().await.expect("failed to send request");
    let status = resp.status();
    let body = resp.json().await.expect("failed to read body");
    (status, body)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
