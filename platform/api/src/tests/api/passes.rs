use chrono::{Duration, Utc};
use reqwest::header;
use reqwest::StatusCode;
use serde_json::json;
use serial_test::serial;
use ulid::Ulid;

use super::{bearer, send, TestApi};
use crate::config::PassConfig;
use crate::database::OwnerInfo;
use crate::global::GlobalStore;
use crate::pass::{self, Owner, RegisterPass};
use crate::tests::global::{guard_token, resident_token};

#[serial]
#[tokio::test]
async fn test_serial_pass_lifecycle() {
    let api = TestApi::start().await;
    let token = resident_token(&api.global, Ulid::new());

    let (status, body) = send(
        api.client
            .post(api.url("/passes/register"))
            .header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({"visitor_name": "Bob", "visitor_phone": "555-0101", "duration_minutes": 90})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["visitor_name"], "Bob");
    assert_eq!(body["visitor_phone"], "555-0101");
    assert_eq!(body["duration_minutes"], 90);
    assert_eq!(body["owner"], json!({"name": "Alice", "phone": "+15550100", "apartment": "12B"}));
    assert_eq!(body["active"], true);
    assert!(!body["token_image"].as_str().unwrap().is_empty());

    let id = body["id"].as_str().unwrap().to_string();
    let content = body["token_content"].as_str().unwrap().to_string();

    // Same phone again, even from another field spelling.
    let (status, body) = send(
        api.client
            .post(api.url("/passes/register"))
            .header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({"name": "Bobby", "phone_number": "555-0101", "duration_minutes": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = send(api.client.get(api.url("/passes/validate")).query(&[("token", &content)])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["pass_id"], id.as_str());
    assert_eq!(body["visitor"], json!({"name": "Bob", "phone": "555-0101"}));
    assert_eq!(body["owner"]["apartment"], "12B");

    let (status, body) = send(
        api.client
            .get(api.url("/passes/list"))
            .header(header::AUTHORIZATION, bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], id.as_str());

    let (status, body) = send(
        api.client
            .put(api.url(&format!("/passes/{id}")))
            .header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({"visitor_name": "Robert"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["visitor_name"], "Robert");
    assert_eq!(body["visitor_phone"], "555-0101");
    assert_ne!(body["token_content"], content.as_str());
    assert!(body["token_content"].as_str().unwrap().contains("Robert"));

    // The old token went with the old visitor name.
    let (_, body) = send(api.client.get(api.url("/passes/validate")).query(&[("token", &content)])).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "not_found");

    let (status, body) = send(
        api.client
            .post(api.url(&format!("/passes/{id}/renew")))
            .query(&[("duration_minutes", "240")])
            .header(header::AUTHORIZATION, bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration_minutes"], 240);
    assert_ne!(body["token_content"], content.as_str());

    let (status, body) = send(
        api.client
            .get(api.url(&format!("/passes/one/{id}")))
            .header(header::AUTHORIZATION, bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration_minutes"], 240);
    let renewed = body["token_content"].as_str().unwrap().to_string();

    let resp = api
        .client
        .delete(api.url(&format!("/passes/{id}")))
        .header(header::AUTHORIZATION, bearer(&token))
        .send()
        .await
        .expect("failed to delete pass");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, _) = send(
        api.client
            .get(api.url(&format!("/passes/one/{id}")))
            .header(header::AUTHORIZATION, bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(api.client.get(api.url("/passes/validate")).query(&[("qr_data", &renewed)])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"valid": false, "message": "pass not found", "reason": "not_found"}));

    api.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_validate_expired() {
    let api = TestApi::start().await;

    let owner = Owner {
        id: Ulid::new(),
        info: OwnerInfo {
            name: "Alice".into(),
            phone: "+15550100".into(),
            apartment: "12B".into(),
        },
    };

    let pass = pass::register(
        api.global.store(),
        &PassConfig::default(),
        &owner,
        RegisterPass {
            visitor_name: "Bob".into(),
            visitor_phone: "555-0101".into(),
            duration_minutes: 30,
        },
        Utc::now() - Duration::hours(2),
    )
    .await
    .expect("failed to register pass");

    let (status, body) = send(
        api.client
            .get(api.url("/passes/validate"))
            .query(&[("token", &pass.token_content)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"valid": false, "message": "pass expired", "reason": "expired"}));

    let (status, body) = send(api.client.get(api.url("/passes/validate"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "missing token"}));

    api.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_pass_access() {
    let api = TestApi::start().await;
    let owner = resident_token(&api.global, Ulid::new());
    let stranger = resident_token(&api.global, Ulid::new());
    let guard = guard_token(&api.global, Ulid::new());

    let (status, body) = send(api.client.get(api.url("/passes/list"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"success": false, "message": "not logged in"}));

    let (status, body) = send(
        api.client
            .get(api.url("/passes/list"))
            .header(header::AUTHORIZATION, "Bearer not-a-token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"success": false, "message": "invalid token"}));

    let (status, body) = send(
        api.client
            .post(api.url("/passes/register"))
            .header(header::AUTHORIZATION, bearer(&guard))
            .json(&json!({"visitor_name": "Bob", "visitor_phone": "555-0101", "duration_minutes": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"success": false, "message": "only residents can do this"}));

    let (_, body) = send(
        api.client
            .post(api.url("/passes/register"))
            .header(header::AUTHORIZATION, bearer(&owner))
            .json(&json!({"visitor_name": "Bob", "visitor_phone": "555-0101", "duration_minutes": 30})),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    for request in [
        api.client.get(api.url(&format!("/passes/one/{id}"))),
        api.client
            .put(api.url(&format!("/passes/{id}")))
            .json(&json!({"visitor_name": "Eve"})),
        api.client.delete(api.url(&format!("/passes/{id}"))),
        api.client
            .post(api.url(&format!("/passes/{id}/renew")))
            .query(&[("duration_minutes", "30")]),
    ] {
        let (status, body) = send(request.header(header::AUTHORIZATION, bearer(&stranger))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "message": "pass not found"}));
    }

    let (status, body) = send(
        api.client
            .get(api.url("/passes/list"))
            .header(header::AUTHORIZATION, bearer(&stranger)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(
        api.client
            .get(api.url("/passes/one/nope"))
            .header(header::AUTHORIZATION, bearer(&owner)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "invalid id"}));

    api.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_register_rejects_bad_input() {
    let api = TestApi::start().await;
    let token = resident_token(&api.global, Ulid::new());

    let cases = [
        (
            json!({"visitor_name": "  ", "visitor_phone": "555-0101", "duration_minutes": 30}),
            "visitor_name must not be empty",
        ),
        (
            json!({"visitor_name": "Bob", "visitor_phone": "555-0101", "duration_minutes": 0}),
            "invalid duration: 0 minutes",
        ),
        (
            json!({"visitor_name": "Bob", "visitor_phone": "555-0101", "duration_minutes": 30, "admin": true}),
            "invalid json body",
        ),
        (json!({"visitor_name": "Bob", "duration_minutes": 30}), "invalid json body"),
    ];

    for (request, message) in cases {
        let (status, body) = send(
            api.client
                .post(api.url("/passes/register"))
                .header(header::AUTHORIZATION, bearer(&token))
                .json(&request),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{request}");
        assert_eq!(body["message"], message, "{request}");
    }

    let (status, body) = send(
        api.client
            .get(api.url("/passes/list"))
            .query(&[("limit", "lots")])
            .header(header::AUTHORIZATION, bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid limit");

    api.shutdown().await;
}
