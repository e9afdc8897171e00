//! HTTP surface tests driven through the router with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

use evi_bridge::{AppState, BridgeConfig, routes};

fn test_config(evi_url: &str) -> BridgeConfig {
    BridgeConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        hume_api_key: "test-key".to_string(),
        hume_config_id: Some("cfg_test".to_string()),
        evi_websocket_url: evi_url.to_string(),
        evi_connect_timeout_seconds: 5,
        stream_poll_seconds: 1,
        stream_max_idle_seconds: 2,
    }
}

fn app(config: BridgeConfig) -> axum::Router {
    routes::create_router().with_state(AppState::new(config))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = app(test_config("ws://127.0.0.1:1"));

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "evi-bridge");
}

#[tokio::test]
async fn voice_incoming_selects_wss_behind_https_proxy() {
    let app = app(test_config("ws://127.0.0.1:1"));

    let request = Request::post("/voice/incoming")
        .header(header::HOST, "bridge.example.com")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let body = body_string(response).await;
    assert!(body.contains("wss://bridge.example.com/voice/stream"));
    assert!(body.contains("<Connect>"));
}

#[tokio::test]
async fn voice_incoming_defaults_to_ws_without_tls() {
    let app = app(test_config("ws://127.0.0.1:1"));

    let request = Request::post("/voice/incoming")
        .header(header::HOST, "bridge.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let body = body_string(response).await;
    assert!(body.contains("ws://bridge.example.com/voice/stream"));
    assert!(!body.contains("wss://"));
}

#[tokio::test]
async fn debug_probe_reports_error_when_evi_is_unreachable() {
    // Bind then drop to get a port nothing listens on.
    let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("ws://{}", unused.local_addr().unwrap());
    drop(unused);

    let app = app(test_config(&dead_url));
    let response = app
        .oneshot(Request::get("/debug/evi").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["config_id"], "cfg_test");
}

#[tokio::test]
async fn debug_probe_reports_ok_when_evi_accepts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(mut ws) = accept_async(stream).await {
                while let Some(msg) = ws.next().await {
                    if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
                        break;
                    }
                }
            }
        }
    });

    let app = app(test_config(&format!("ws://{addr}")));
    let response = app
        .oneshot(Request::get("/debug/evi").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}
