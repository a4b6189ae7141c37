//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use content_dispatch::{App, Handlers, HttpServer, Shutdown};

/// Default handler used by most routes.
pub async fn hank() -> Json<Value> {
    Json(json!({ "first": "Hank", "last": "Leupen" }))
}

/// `text/plain` handler used by most routes.
pub fn plain_hank() -> Handlers {
    Handlers::new().on("text/plain", |_| async {
        ([(CONTENT_TYPE, "text/plain")], "Hank is the best")
    })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
    pub response_headers: axum::http::HeaderMap,
}

impl TestResponse {
    /// Media type without parameters.
    pub fn media_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Send one GET request through the router.
pub async fn get(router: &Router, path: &str, accept: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().uri(path);
    if let Some(accept) = accept {
        builder = builder.header("accept", accept);
    }
    let request = builder.body(Body::empty()).unwrap();
    collect(router.clone().oneshot(request).await.unwrap()).await
}

/// Buffer a response into a [`TestResponse`].
pub async fn collect(response: Response) -> TestResponse {
    let status = response.status();
    let response_headers = response.headers().clone();
    let content_type = response_headers
        .get(CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        content_type,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
        response_headers,
    }
}

/// Serve `app` on an ephemeral port until the returned shutdown is triggered.
pub async fn spawn_server(app: App) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = HttpServer::new(app).run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown)
}
