//! End-to-end key and token lifecycle against a mock device server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use deviceserver_client::{EntryPoint, RestClient, token_from_psk, verify};
use hateoas::{Client, ClientConfig, Headers, LoggingTransport};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const PSK: &str = "device-server-psk";

fn signed_with_psk(request: &Request) -> bool {
    request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| verify(token, PSK.as_bytes()).is_ok())
}

async fn mount_device_server(server: &MockServer) {
    let uri = server.uri();

    // Authenticated sessions see the key collection, anonymous ones do not.
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Links": [
                {"rel": "authenticate", "href": format!("{uri}/oauth/token")},
                {"rel": "accesskeys", "href": format!("{uri}/keys")},
            ],
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Links": [{"rel": "authenticate", "href": format!("{uri}/oauth/token")}],
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/keys"))
        .and(signed_with_psk)
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "Name": "bob",
            "Key": "k-1",
            "Secret": "s-1",
            "Links": [{"rel": "self", "href": format!("{uri}/keys/1")}],
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=k-1"))
        .and(body_string_contains("password=s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt-1",
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-2",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt-2",
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ErrorCode": "Unauthorized",
            "ErrorMessage": "bad credentials",
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/keys"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "PageInfo": {"TotalCount": 1, "ItemsCount": 1, "StartIndex": 0},
            "Items": [{
                "Name": "bob",
                "Key": "k-1",
                "Links": [{"rel": "self", "href": format!("{uri}/keys/1")}],
            }],
        })))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/keys/1"))
        .and(header("authorization", "Bearer at-2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_key_lifecycle() {
    let server = MockServer::start().await;
    mount_device_server(&server).await;

    let transport = Arc::new(LoggingTransport::new(reqwest::Client::new()));
    let mut client = RestClient::new(
        Client::with_transport(ClientConfig::new(server.uri()), transport).unwrap(),
    )
    .unwrap();

    // Bootstrap the first key with a PSK token.
    let psk = SecretString::from(PSK.to_string());
    let admin = token_from_psk(&psk, 0).unwrap();
    client.set_bearer_token(admin.expose_secret()).unwrap();

    let key = client.create_access_key("bob").await.unwrap();
    assert_eq!(key.key, "k-1");
    assert_eq!(key.secret.as_ref().unwrap().expose_secret(), "s-1");

    // Anonymous sessions cannot see the key collection.
    client.set_bearer_token("").unwrap();
    let entry = client
        .hateoas()
        .get::<EntryPoint>("", &[], &Headers::new())
        .await
        .unwrap()
        .value;
    assert!(entry.links.get("accesskeys").unwrap_err().is_link_not_found());

    client.authenticate(&key).await.unwrap();
    assert_eq!(
        client.token().unwrap().access_token.expose_secret(),
        "at-1"
    );
    assert!(client.token_expires().unwrap() > chrono::Utc::now());

    let keys = client.get_access_keys(None).await.unwrap().unwrap();
    assert!(keys.items.iter().any(|k| k.key == key.key));
    assert!(client.get_access_keys(Some(&keys)).await.unwrap().is_none());

    let refresh = client
        .token()
        .unwrap()
        .refresh_token
        .as_ref()
        .unwrap()
        .expose_secret()
        .to_string();
    client.refresh_auth(&refresh).await.unwrap();
    assert_eq!(
        client.token().unwrap().access_token.expose_secret(),
        "at-2"
    );

    client.delete_access_key(&key).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .any(|r| r.method.as_str() == "DELETE" && r.url.path() == "/keys/1")
    );
}

#[tokio::test]
async fn test_failed_authentication_keeps_previous_state() {
    let server = MockServer::start().await;
    mount_device_server(&server).await;

    let mut client = RestClient::connect(ClientConfig::new(server.uri())).unwrap();
    let good: deviceserver_client::AccessKey =
        serde_json::from_value(json!({"Key": "k-1", "Secret": "s-1"})).unwrap();
    client.authenticate(&good).await.unwrap();
    let expires = client.token_expires();

    let bad: deviceserver_client::AccessKey =
        serde_json::from_value(json!({"Key": "k-1", "Secret": "wrong"})).unwrap();
    let err = client.authenticate(&bad).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(
        client.token().unwrap().access_token.expose_secret(),
        "at-1"
    );
    assert_eq!(client.token_expires(), expires);
    assert_eq!(
        client
            .hateoas()
            .default_headers()
            .get("authorization")
            .unwrap(),
        "Bearer at-1"
    );
}

#[tokio::test]
async fn test_rejected_refresh_keeps_previous_state() {
    let server = MockServer::start().await;
    mount_device_server(&server).await;

    let mut client = RestClient::connect(ClientConfig::new(server.uri())).unwrap();
    let good: deviceserver_client::AccessKey =
        serde_json::from_value(json!({"Key": "k-1", "Secret": "s-1"})).unwrap();
    client.authenticate(&good).await.unwrap();
    let expires = client.token_expires();

    let err = client.refresh_auth("revoked").await.unwrap_err();

    assert!(err.is_unauthorized());
    let token = client.token().unwrap();
    assert_eq!(token.access_token.expose_secret(), "at-1");
    assert_eq!(
        token.refresh_token.as_ref().unwrap().expose_secret(),
        "rt-1"
    );
    assert_eq!(client.token_expires(), expires);
    assert_eq!(
        client
            .hateoas()
            .default_headers()
            .get("authorization")
            .unwrap(),
        "Bearer at-1"
    );
}
