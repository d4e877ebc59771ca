mod common;

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn search_call(id: u64) -> Value {
    json!({
        "id": id,
        "method": "tools/call",
        "params": { "name": "search", "arguments": { "query": "estimate", "limit": 3 } }
    })
}

fn direct_envelope() -> Value {
    json!({ "method": "search", "params": { "query": "estimate", "limit": 3 } })
}

fn wrapped_envelope() -> Value {
    json!({ "event": { "body": direct_envelope() } })
}

#[actix_web::test]
async fn tools_call_returns_downstream_body() {
    let app = common::spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_json(direct_envelope()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "posts": [] })))
        .expect(1)
        .mount(&app.downstream)
        .await;

    let response = app.post_rpc(search_call(7)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "jsonrpc": "2.0", "id": 7, "result": { "success": true, "posts": [] } })
    );
    // accepted on the first shape, so no second attempt
    assert_eq!(app.downstream_bodies().await, vec![direct_envelope()]);
}

#[actix_web::test]
async fn rejected_direct_shape_falls_back_to_wrapped() {
    let app = common::spawn_app().await;
    Mock::given(method("POST"))
        .and(body_json(direct_envelope()))
        .respond_with(ResponseTemplate::new(500).set_body_string("unsupported payload"))
        .expect(1)
        .mount(&app.downstream)
        .await;
    Mock::given(method("POST"))
        .and(body_json(wrapped_envelope()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "body": { "posts": ["a"] } })),
        )
        .expect(1)
        .mount(&app.downstream)
        .await;

    let body: Value = app.post_rpc(search_call(8)).await.json().await.unwrap();

    assert_eq!(body["result"], json!({ "posts": ["a"] }));
    assert!(body.get("error").is_none());
    assert_eq!(
        app.downstream_bodies().await,
        vec![direct_envelope(), wrapped_envelope()]
    );
}

#[actix_web::test]
async fn both_shapes_rejected_is_server_error() {
    let app = common::spawn_app().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({ "error": "bad gateway" })))
        .expect(2)
        .mount(&app.downstream)
        .await;

    let response = app.post_rpc(search_call(9)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], 9);
    assert!(body.get("result").is_none());
    assert_eq!(body["error"]["code"], -32000);
    assert_eq!(body["error"]["data"]["status"], 502);
    assert_eq!(body["error"]["data"]["body"]["error"], "bad gateway");
}

#[actix_web::test]
async fn timed_out_direct_shape_falls_back_by_default() {
    let app = common::spawn_app_with(|settings| settings.downstream.timeout_ms = 200).await;
    Mock::given(method("POST"))
        .and(body_json(direct_envelope()))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&app.downstream)
        .await;
    Mock::given(method("POST"))
        .and(body_json(wrapped_envelope()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": "wrapped" })))
        .expect(1)
        .mount(&app.downstream)
        .await;

    let body: Value = app.post_rpc(search_call(10)).await.json().await.unwrap();

    assert_eq!(body["result"], json!({ "ok": "wrapped" }));
}

#[actix_web::test]
async fn timed_out_direct_shape_is_terminal_without_transport_fallback() {
    let app = common::spawn_app_with(|settings| {
        settings.downstream.timeout_ms = 200;
        settings.downstream.fallback_on_transport_error = false;
    })
    .await;
    Mock::given(method("POST"))
        .and(body_json(direct_envelope()))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&app.downstream)
        .await;
    Mock::given(method("POST"))
        .and(body_json(wrapped_envelope()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.downstream)
        .await;

    let body: Value = app.post_rpc(search_call(11)).await.json().await.unwrap();

    assert_eq!(body["error"]["code"], -32000);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("timeout"));
}

#[actix_web::test]
async fn unreachable_downstream_is_server_error() {
    let app = common::spawn_app_with(|settings| {
        settings.downstream.url = "http://127.0.0.1:9/".to_string();
    })
    .await;

    let response = app.post_rpc(search_call(12)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], 12);
    assert_eq!(body["error"]["code"], -32000);
}

#[actix_web::test]
async fn non_json_downstream_body_is_empty_result() {
    let app = common::spawn_app().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Success"))
        .mount(&app.downstream)
        .await;

    let body: Value = app.post_rpc(search_call(13)).await.json().await.unwrap();

    assert_eq!(body["result"], json!({}));
}

#[actix_web::test]
async fn handshake_and_listing_stay_local() {
    let app = common::spawn_app().await;

    let init: Value = app
        .post_rpc(json!({ "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2024-11-05",
            "clientInfo": { "name": "orchestrator", "version": "1.0" }
        }}))
        .await
        .json()
        .await
        .unwrap();
    let ready: Value = app
        .post_rpc(json!({ "method": "notifications/initialized" }))
        .await
        .json()
        .await
        .unwrap();
    let listed: Value = app
        .post_rpc(json!({ "id": "list-1", "method": "tools/list" }))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(ready["result"], json!({ "ok": true }));
    assert!(ready.get("id").is_none());
    assert_eq!(listed["id"], "list-1");
    assert_eq!(listed["result"]["tools"][0]["name"], "search");
    assert!(listed["result"]["tools"][0]["inputSchema"].is_object());
    assert!(app.downstream_bodies().await.is_empty());
}

#[actix_web::test]
async fn unknown_method_is_method_not_found() {
    let app = common::spawn_app().await;

    for method_name in [json!("resources/list"), json!(""), json!(null)] {
        let response = app.post_rpc(json!({ "id": 3, "method": method_name })).await;

        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["error"]["message"], "Method not found");
    }

    assert!(app.downstream_bodies().await.is_empty());
}

#[actix_web::test]
async fn tools_call_without_arguments_never_reaches_downstream() {
    let app = common::spawn_app().await;

    let body: Value = app
        .post_rpc(json!({ "id": 4, "method": "tools/call", "params": { "name": "search" } }))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["error"]["code"], -32602);
    assert!(app.downstream_bodies().await.is_empty());
}

#[actix_web::test]
async fn missing_method_is_bad_request() {
    let app = common::spawn_app().await;

    let response = app.post_rpc(json!({ "id": 5, "params": {} })).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing method");
}

#[actix_web::test]
async fn unparseable_body_is_bad_request() {
    let app = common::spawn_app().await;

    let response = reqwest::Client::new()
        .post(&app.address)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON");
}

#[actix_web::test]
async fn event_stream_accept_gets_single_message_event() {
    let app = common::spawn_app().await;

    let response = reqwest::Client::new()
        .post(&app.address)
        .header("Accept", "text/event-stream")
        .json(&json!({ "id": 6, "method": "tools/list" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    let text = response.text().await.unwrap();
    let data = text
        .strip_prefix("event: message\ndata: ")
        .and_then(|rest| rest.strip_suffix("\n\n"))
        .expect("single message frame");
    let body: Value = serde_json::from_str(data).unwrap();
    assert_eq!(body["id"], 6);
    assert!(body["result"]["tools"].is_array());
}
