#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use mediaset_api::config::ServerConfig;
use mediaset_api::routes;
use mediaset_api::state::AppState;
use mediaset_core::captioning::{CaptionError, CaptionGenerator, UnconfiguredCaptioner};

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "mediaset-test-boundary";

/// Temporary public directory plus the app wired to it.
pub struct TestEnv {
    pub dir: TempDir,
    pub config: ServerConfig,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        Self { dir, config }
    }

    /// App with captioning disabled.
    pub fn app(&self) -> Router {
        build_test_app(self.config.clone(), Arc::new(UnconfiguredCaptioner))
    }

    pub fn app_with(&self, captioner: Arc<dyn CaptionGenerator>) -> Router {
        build_test_app(self.config.clone(), captioner)
    }

    pub fn datasets_root(&self) -> &Path {
        &self.config.datasets_root
    }

    pub fn dataset_file(&self, dataset: &str, category: &str, file: &str) -> PathBuf {
        self.datasets_root().join(dataset).join(category).join(file)
    }

    /// Write a file straight into a dataset, creating directories as needed.
    pub fn seed(&self, dataset: &str, category: &str, file: &str, contents: &[u8]) -> PathBuf {
        let path = self.dataset_file(dataset, category, file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }
}

/// Build a test `ServerConfig` rooted at `base`.
///
/// Uses `http://localhost:5173` as CORS origin and a 30-second request timeout.
pub fn test_config(base: &Path) -> ServerConfig {
    let public_dir = base.join("public");
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        datasets_root: public_dir.join("datasets"),
        public_dir,
        upload_staging_dir: base.join("staging"),
        max_upload_bytes: 8 * 1024 * 1024,
        caption: None,
    }
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses.
pub fn build_test_app(config: ServerConfig, captioner: Arc<dyn CaptionGenerator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");
    let datasets = ServeDir::new(&config.datasets_root);
    let public = ServeDir::new(&config.public_dir);
    let body_limit = config.max_upload_bytes;
    let state = AppState::new(config, captioner);

    Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api_routes())
        .nest_service("/datasets", datasets)
        .fallback_service(public)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Captioner stubs
// ---------------------------------------------------------------------------

/// Returns a fixed caption and records which files it was asked about.
#[derive(Default)]
pub struct StubCaptioner {
    pub caption: String,
    pub calls: Mutex<Vec<PathBuf>>,
}

impl StubCaptioner {
    pub fn new(caption: &str) -> Arc<Self> {
        Arc::new(Self {
            caption: caption.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptionGenerator for StubCaptioner {
    async fn generate(&self, media_path: &Path) -> Result<String, CaptionError> {
        self.calls.lock().unwrap().push(media_path.to_path_buf());
        Ok(self.caption.clone())
    }
}

/// Always fails as if the remote service were down.
pub struct FailingCaptioner;

#[async_trait]
impl CaptionGenerator for FailingCaptioner {
    async fn generate(&self, _media_path: &Path) -> Result<String, CaptionError> {
        Err(CaptionError::Upstream("connection refused".into()))
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

/// Encode `parts` as a `multipart/form-data` body delimited by [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = body_bytes(response).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}
