//! End-to-end relay tests: signed inbound POST through the router, outbound
//! delivery observed on a mock Discord webhook.

use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use fatbot_relay::config::Config;
use fatbot_relay::{server, signature};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "relay-e2e-secret";

fn config_with_webhook(webhook: Option<String>) -> Config {
    Config {
        signing_secret: Some(SECRET.into()),
        discord_webhook: webhook,
        max_body_bytes: 100_000,
        allowed_chains: HashSet::from(["solana".to_string(), "ethereum".to_string()]),
        default_chain: "solana".into(),
        trading_base_url: "https://fatbot.fatty.io".into(),
        forward_timeout: Duration::from_secs(5),
    }
}

fn app(config: Config) -> Router {
    server::router(config).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4242))))
}

fn signed_post(route: &str, body: &str) -> Request<Body> {
    let sig = signature::hex_digest(SECRET, body.as_bytes());
    Request::post(route)
        .header("content-type", "application/json")
        .header("x-nansen-signature", sig)
        .body(Body::from(body.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn alert_is_rewritten_and_forwarded() {
    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&discord)
        .await;

    let app = app(config_with_webhook(Some(format!("{}/hook", discord.uri()))));
    let body = r#"{
        "alerts": [{
            "symbol": "FOO",
            "url": "https://app.nansen.ai/token-god-mode?tokenAddress=XYZ&chain=ethereum",
            "inflow": 1000.5,
            "receivers": 3
        }]
    }"#;

    let response = app.oneshot(signed_post("/nansen", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = discord.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let forwarded = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(forwarded.contains("FOO"));
    assert!(forwarded.contains("https://fatbot.fatty.io/manual-trading/ETHEREUM/XYZ"));
    assert!(forwarded.contains("$1,000.50"));
    assert!(forwarded.contains("Receivers: 3"));
}

#[tokio::test]
async fn downstream_failure_is_still_acknowledged() {
    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&discord)
        .await;

    let app = app(config_with_webhook(Some(discord.uri())));
    let response = app
        .oneshot(signed_post("/nansen", r#"{"content":"hello"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn discord_compat_route_forwards_and_returns_204() {
    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&discord)
        .await;

    let app = app(config_with_webhook(Some(format!("{}/hook", discord.uri()))));
    let body = r#"{
        "content": "see https://app.nansen.ai/token-god-mode?tokenAddress=ABC12345&chain=solana",
        "embeds": []
    }"#;

    let response = app
        .oneshot(signed_post("/api/webhooks/99/native-token", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let requests = discord.received_requests().await.unwrap();
    let forwarded = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(forwarded.contains("https://fatbot.fatty.io/manual-trading/SOLANA/ABC12345"));
}

#[tokio::test]
async fn invalid_signature_makes_no_outbound_call() {
    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&discord)
        .await;

    let app = app(config_with_webhook(Some(discord.uri())));
    let request = Request::post("/nansen")
        .header("x-nansen-signature", "deadbeef")
        .body(Body::from(r#"{"content":"hi"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn oversized_body_makes_no_outbound_call() {
    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&discord)
        .await;

    let config = Config {
        max_body_bytes: 64,
        ..config_with_webhook(Some(discord.uri()))
    };
    let body = format!(r#"{{"content":"{}"}}"#, "x".repeat(200));
    let response = app(config).oneshot(signed_post("/nansen", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn no_webhook_configured_still_succeeds() {
    let app = app(config_with_webhook(None));
    let response = app
        .oneshot(signed_post("/nansen", r#"{"alerts":[{"symbol":"BAR"}]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
