use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use crate::common::{TestApp, routes};

fn png_bytes(data_url: &serde_json::Value) -> Vec<u8> {
    let encoded = data_url
        .as_str()
        .unwrap()
        .strip_prefix("data:image/png;base64,")
        .expect("PNG data URL");
    BASE64.decode(encoded).unwrap()
}

#[tokio::test]
async fn identity_token_is_stable_until_rotated() {
    let app = TestApp::spawn().await;
    let alice = app.create_visitor("Alice").await;

    let first = app.get_with_token(routes::IDENTITY_TOKEN, &alice.token).await;
    assert_eq!(first.status, 200, "{}", first.text);
    assert_eq!(first.body["user_id"], alice.id);
    let payload = first.body["payload"].as_str().unwrap().to_string();
    assert!(payload.starts_with(&format!("evreg://u?id={}&e=", alice.id)));
    assert!(first.body["svg"].as_str().unwrap().contains("<svg"));
    let png = png_bytes(&first.body["data_url"]);
    assert_eq!(&png[..4], b"\x89PNG");

    let second = app.get_with_token(routes::IDENTITY_TOKEN, &alice.token).await;
    assert_eq!(second.body["payload"], payload.as_str());

    let rotated = app
        .post_with_token(&routes::rotate(false), &json!({}), &alice.token)
        .await;
    assert_eq!(rotated.status, 200, "{}", rotated.text);
    assert_eq!(rotated.body["emailed"], false);
    assert!(rotated.body["delivery_error"].is_null());
    let new_payload = rotated.body["token"]["payload"].as_str().unwrap();
    assert_ne!(new_payload, payload);

    let after = app.get_with_token(routes::IDENTITY_TOKEN, &alice.token).await;
    assert_eq!(after.body["payload"], new_payload);
}

#[tokio::test]
async fn rotation_stands_when_notification_cannot_be_delivered() {
    let app = TestApp::spawn().await;
    let alice = app.create_visitor("Alice").await;
    let before = app.get_with_token(routes::IDENTITY_TOKEN, &alice.token).await;

    let res = app
        .post_with_token(&routes::rotate(true), &json!({}), &alice.token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["emailed"], false);
    assert!(res.body["delivery_error"].is_string());
    assert_ne!(res.body["token"]["payload"], before.body["payload"]);
}

#[tokio::test]
async fn rotation_with_notify_sends_the_new_code() {
    let app = TestApp::spawn_with_mail().await;
    let alice = app.create_visitor("Alice").await;

    let res = app
        .post_with_token(&routes::rotate(true), &json!({}), &alice.token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["emailed"], true);

    let sent = app.outbox.as_ref().unwrap().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    let png = png_bytes(&res.body["token"]["data_url"]);
    assert_eq!(sent[0].attachments[0].content, png);
}

#[tokio::test]
async fn email_endpoint_reports_missing_transport() {
    let app = TestApp::spawn().await;
    let alice = app.create_visitor("Alice").await;

    let res = app
        .post_with_token(routes::IDENTITY_TOKEN_EMAIL, &json!({}), &alice.token)
        .await;

    assert_eq!(res.status, 503);
    assert_eq!(res.code(), "DELIVERY_UNAVAILABLE");
}

#[tokio::test]
async fn email_endpoint_attaches_the_qr_code() {
    let app = TestApp::spawn_with_mail().await;
    let alice = app.create_visitor("Alice").await;

    let res = app
        .post_with_token(routes::IDENTITY_TOKEN_EMAIL, &json!({}), &alice.token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["emailed"], true);
    assert_eq!(res.body["to"], "alice@example.com");

    let sent = app.outbox.as_ref().unwrap().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].attachments.len(), 1);
    assert_eq!(sent[0].attachments[0].filename, "identity-qr.png");
    assert_eq!(sent[0].attachments[0].content_type, "image/png");
    assert_eq!(&sent[0].attachments[0].content[..4], b"\x89PNG");
}

#[tokio::test]
async fn identity_token_requires_authentication() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::IDENTITY_TOKEN).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "TOKEN_MISSING");
}
