use reqwest::header;
use reqwest::StatusCode;
use serde_json::json;
use serial_test::serial;
use ulid::Ulid;

use super::{bearer, send, TestApi};
use crate::tests::global::{guard_token, resident_token};

#[serial]
#[tokio::test]
async fn test_serial_gate_flow() {
    let api = TestApi::start().await;
    let resident = resident_token(&api.global, Ulid::new());
    let guard = guard_token(&api.global, Ulid::new());

    let (_, body) = send(
        api.client
            .post(api.url("/passes/register"))
            .header(header::AUTHORIZATION, bearer(&resident))
            .json(&json!({"visitor_name": "Bob", "visitor_phone": "555-0101", "duration_minutes": 60})),
    )
    .await;
    let pass_id = body["id"].as_str().unwrap().to_string();
    let content = body["token_content"].as_str().unwrap().to_string();

    let (status, body) = send(
        api.client
            .post(api.url("/scans/scan"))
            .header(header::AUTHORIZATION, bearer(&guard))
            .json(&json!({"qr_data": content})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["pass_id"], pass_id.as_str());
    assert_eq!(body["visitor"]["name"], "Bob");
    let valid_scan = body["scan_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        api.client
            .post(api.url("/scans/scan"))
            .header(header::AUTHORIZATION, bearer(&guard))
            .json(&json!({"token": "not a pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "not_found");
    let invalid_scan = body["scan_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        api.client
            .post(api.url("/scans/confirm"))
            .header(header::AUTHORIZATION, bearer(&guard))
            .json(&json!({"scan_id": invalid_scan, "confirmed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "cannot approve entry on an invalid pass");

    let (status, body) = send(
        api.client
            .post(api.url("/scans/confirm"))
            .header(header::AUTHORIZATION, bearer(&guard))
            .json(&json!({"scan_id": invalid_scan, "confirmed": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "entry denied", "scan_id": invalid_scan})
    );

    let (status, body) = send(
        api.client
            .post(api.url("/scans/confirm"))
            .header(header::AUTHORIZATION, bearer(&guard))
            .json(&json!({"scan_id": valid_scan, "confirmed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "entry approved");

    let (status, _) = send(
        api.client
            .post(api.url("/scans/confirm"))
            .header(header::AUTHORIZATION, bearer(&guard))
            .json(&json!({"scan_id": valid_scan, "confirmed": false})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        api.client
            .get(api.url("/scans/history"))
            .query(&[("limit", "10")])
            .header(header::AUTHORIZATION, bearer(&guard)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["id"], invalid_scan.as_str());
    assert_eq!(history[0]["confirmed"], false);
    assert_eq!(history[1]["id"], valid_scan.as_str());
    assert_eq!(history[1]["resident_apartment"], "12B");
    assert_eq!(history[1]["visitor_name"], "Bob");

    let (status, body) = send(
        api.client
            .get(api.url("/scans/stats"))
            .header(header::AUTHORIZATION, bearer(&guard)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"today_scans": 2, "today_approved": 1, "today_denied": 1, "guard_name": "Gate Keeper"})
    );

    api.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_scans_are_guard_only() {
    let api = TestApi::start().await;
    let resident = resident_token(&api.global, Ulid::new());
    let guard = guard_token(&api.global, Ulid::new());
    let other_guard = guard_token(&api.global, Ulid::new());

    let (status, body) = send(
        api.client
            .post(api.url("/scans/scan"))
            .header(header::AUTHORIZATION, bearer(&resident))
            .json(&json!({"token": "anything"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"success": false, "message": "only guards can do this"}));

    let (status, _) = send(api.client.get(api.url("/scans/stats"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(
        api.client
            .post(api.url("/scans/scan"))
            .header(header::AUTHORIZATION, bearer(&guard))
            .json(&json!({"token": "anything"})),
    )
    .await;
    let scan_id = body["scan_id"].as_str().unwrap().to_string();

    // Scans belong to the guard who made them.
    let (status, body) = send(
        api.client
            .post(api.url("/scans/confirm"))
            .header(header::AUTHORIZATION, bearer(&other_guard))
            .json(&json!({"scan_id": scan_id, "confirmed": false})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "scan not found"}));

    let (status, body) = send(
        api.client
            .get(api.url("/scans/history"))
            .header(header::AUTHORIZATION, bearer(&other_guard)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    api.shutdown().await;
}
