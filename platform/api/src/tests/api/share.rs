use reqwest::header;
use reqwest::StatusCode;
use serde_json::json;
use serial_test::serial;
use ulid::Ulid;

use super::{bearer, send, TestApi};
use crate::tests::global::resident_token;

#[serial]
#[tokio::test]
async fn test_serial_share_link() {
    let api = TestApi::start().await;
    let token = resident_token(&api.global, Ulid::new());

    let (_, body) = send(
        api.client
            .post(api.url("/passes/register"))
            .header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({"visitor_name": "Bob", "visitor_phone": "555-0101", "duration_minutes": 60})),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        api.client
            .post(api.url(&format!("/passes/{id}/share")))
            .header(header::AUTHORIZATION, bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let share_token = body["share_token"].as_str().unwrap().to_string();

    // Anyone holding the link can read the pass.
    let (status, body) = send(api.client.get(api.url("/passes/shared")).query(&[("token", &share_token)])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["visitor_name"], "Bob");

    // An identity token is not a share link.
    let (status, _) = send(api.client.get(api.url("/passes/shared")).query(&[("token", &token)])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(api.client.get(api.url("/passes/shared")).query(&[("token", "garbage")])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Renewing starts a new generation, old links stop working.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, _) = send(
        api.client
            .post(api.url(&format!("/passes/{id}/renew")))
            .query(&[("duration_minutes", "60")])
            .header(header::AUTHORIZATION, bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(api.client.get(api.url("/passes/shared")).query(&[("token", &share_token)])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "pass not found"}));

    // Only the owner can share.
    let stranger = resident_token(&api.global, Ulid::new());
    let (status, _) = send(
        api.client
            .post(api.url(&format!("/passes/{id}/share")))
            .header(header::AUTHORIZATION, bearer(&stranger)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    api.shutdown().await;
}
