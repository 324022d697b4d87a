#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tokio::sync::Notify;
use tower::util::ServiceExt;

use convertflow::api::{router, ApiState};
use convertflow::convert::{VideoFormat, VideoMetadata, VideoProvider};
use convertflow::error::ConvertError;
use convertflow::jobs::JobStatus;
use convertflow::{JobStore, TransferRunner};

/// What the stub should answer for metadata resolution.
pub enum StubMetadata {
    Ok(VideoMetadata),
    Err(String),
}

/// Scripted [`VideoProvider`]: metadata is canned, and the transfer blocks
/// until the test releases it, then writes the scripted bytes or fails.
pub struct StubProvider {
    pub metadata: StubMetadata,
    pub transfer: Result<Vec<u8>, String>,
    pub release: Notify,
}

impl StubProvider {
    pub fn succeeding(bytes: &[u8]) -> Self {
        Self {
            metadata: StubMetadata::Ok(sample_metadata()),
            transfer: Ok(bytes.to_vec()),
            release: Notify::new(),
        }
    }

    pub fn failing_transfer(message: &str) -> Self {
        Self {
            metadata: StubMetadata::Ok(sample_metadata()),
            transfer: Err(message.to_string()),
            release: Notify::new(),
        }
    }

    pub fn without_formats() -> Self {
        Self {
            metadata: StubMetadata::Ok(VideoMetadata {
                title: "Empty".to_string(),
                formats: Vec::new(),
            }),
            transfer: Err("unreachable".to_string()),
            release: Notify::new(),
        }
    }

    pub fn failing_metadata(message: &str) -> Self {
        Self {
            metadata: StubMetadata::Err(message.to_string()),
            transfer: Err("unreachable".to_string()),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl VideoProvider for StubProvider {
    async fn metadata(&self, _url: &str) -> Result<VideoMetadata, ConvertError> {
        match &self.metadata {
            StubMetadata::Ok(meta) => Ok(meta.clone()),
            StubMetadata::Err(message) => Err(ConvertError::upstream(message.clone())),
        }
    }

    async fn download(&self, _format: &VideoFormat, dest: &Path) -> Result<u64, ConvertError> {
        self.release.notified().await;
        match &self.transfer {
            Ok(bytes) => {
                tokio::fs::write(dest, bytes).await?;
                Ok(bytes.len() as u64)
            }
            Err(message) => Err(ConvertError::upstream(message.clone())),
        }
    }
}

pub fn sample_metadata() -> VideoMetadata {
    VideoMetadata {
        title: "Stub Clip".to_string(),
        formats: vec![VideoFormat {
            format_id: "18".to_string(),
            url: "https://cdn.example/18".to_string(),
            container: "mp4".to_string(),
            has_audio: true,
            has_video: true,
            height: Some(360),
        }],
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: JobStore,
    pub provider: Arc<StubProvider>,
    pub runner: TransferRunner,
    // Held so the artifact directories outlive the test.
    pub data_dir: TempDir,
}

pub fn setup_app(provider: StubProvider) -> TestApp {
    let data_dir = TempDir::new().expect("temp data dir");
    let uploads_dir = data_dir.path().join("uploads");
    let downloads_dir = data_dir.path().join("downloads");
    std::fs::create_dir_all(&uploads_dir).unwrap();
    std::fs::create_dir_all(&downloads_dir).unwrap();

    let store = JobStore::new();
    let provider = Arc::new(provider);
    let runner = TransferRunner::new(
        store.clone(),
        provider.clone() as Arc<dyn VideoProvider>,
        downloads_dir.clone(),
    );

    let app = router(ApiState {
        jobs: store.clone(),
        runner: runner.clone(),
        uploads_dir,
        downloads_dir,
        max_upload_bytes: 1024 * 1024,
    });

    TestApp {
        app,
        store,
        provider,
        runner,
        data_dir,
    }
}

pub async fn get(app: &Router, path: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: &Router, path: &str, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

const BOUNDARY: &str = "convertflow-test-boundary";

/// Upload one file as the `file` multipart field.
pub async fn post_file(
    app: &Router,
    path: &str,
    file_name: &str,
    bytes: &[u8],
) -> Response<Body> {
    post_file_named(app, path, "file", file_name, bytes).await
}

/// Same, with control over the field name.
pub async fn post_file_named(
    app: &Router,
    path: &str,
    field_name: &str,
    file_name: &str,
    bytes: &[u8],
) -> Response<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    app.clone()
        .oneshot(
            Request::post(path)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("JSON body")
}

pub async fn assert_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

/// Poll the store until the job leaves its non-terminal states.
pub async fn wait_for_terminal(store: &JobStore, id: u64) -> JobStatus {
    for _ in 0..200 {
        if let Some(job) = store.get(id).await {
            if job.status.is_terminal() {
                return job.status;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never reached a terminal state");
}
