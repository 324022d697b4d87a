//! HTTP surface: conversion endpoints, status polling, artifact download.

use std::path::PathBuf;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::convert;
use crate::error::ConvertError;
use crate::jobs::{JobKind, JobStatus, JobStore, MetricsPatch, NewJob, TransferRunner};

pub mod models;

use models::{ConversionResponse, JobSummary, RemoteVideoRequest, StatusResponse};

/// Everything the handlers need, injected explicitly rather than held in a
/// process-wide global.
#[derive(Clone)]
pub struct ApiState {
    pub jobs: JobStore,
    pub runner: TransferRunner,
    pub uploads_dir: PathBuf,
    pub downloads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

pub fn router(state: ApiState) -> Router {
    // Leave headroom above the payload cap for multipart framing.
    let body_limit = state.max_upload_bytes + 64 * 1024;
    Router::new()
        .route("/convert/remote-video", post(convert_remote_video))
        .route("/convert/:kind", post(convert_upload))
        .route("/conversion-status/:id", get(conversion_status))
        .route("/download/:id", get(download))
        .route("/conversions", get(list_conversions))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// `POST /convert/{kind}` for the synchronous kinds. The record and the
/// response are created together: any failure before that point leaves no
/// trace in the store.
async fn convert_upload(
    State(state): State<ApiState>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Json<ConversionResponse>, ConvertError> {
    let kind = JobKind::from_str(&kind)
        .filter(|k| *k != JobKind::RemoteVideoFetch)
        .ok_or_else(|| ConvertError::invalid(format!("unknown conversion kind: {kind}")))?;

    let upload = read_upload(multipart, state.max_upload_bytes).await?;
    let converted_name = converted_name_for(kind, &upload.file_name)?;

    // Keep a copy of the raw upload, mirroring the upload/download split on
    // disk.
    let upload_path = state
        .uploads_dir
        .join(format!("{}_{}", Uuid::new_v4(), upload.file_name));
    tokio::fs::write(&upload_path, &upload.bytes).await?;

    let original_size = upload.bytes.len() as u64;
    let started = Instant::now();
    let output = run_converter(kind, upload.file_name.clone(), upload.bytes).await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let artifact_path = state.downloads_dir.join(&converted_name);
    tokio::fs::write(&artifact_path, &output).await?;

    let job = state
        .jobs
        .create(NewJob {
            original_name: upload.file_name,
            converted_name,
            kind,
            status: Some(JobStatus::Completed),
            file_path: Some(artifact_path),
            error: None,
        })
        .await;
    state
        .jobs
        .update_metrics(
            job.id,
            MetricsPatch {
                original_size: Some(original_size),
                converted_size: Some(output.len() as u64),
                conversion_time_ms: Some(elapsed_ms),
            },
        )
        .await;

    info!(
        job_id = job.id,
        kind = kind.as_str(),
        elapsed_ms,
        "conversion completed"
    );
    Ok(Json(ConversionResponse::from_job(&job)))
}

/// `POST /convert/remote-video`: answers with the job id as soon as the
/// record exists; the transfer finishes in the background.
async fn convert_remote_video(
    State(state): State<ApiState>,
    Json(body): Json<RemoteVideoRequest>,
) -> Result<Json<ConversionResponse>, ConvertError> {
    if body.url.trim().is_empty() {
        return Err(ConvertError::invalid("video URL is required"));
    }

    let job = state.runner.begin(body.url.trim()).await?;
    Ok(Json(ConversionResponse::from_job(&job)))
}

async fn conversion_status(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<Json<StatusResponse>, ConvertError> {
    let job = state
        .jobs
        .get(id)
        .await
        .ok_or_else(|| ConvertError::NotFound("conversion not found".into()))?;

    Ok(Json(StatusResponse {
        id: job.id,
        status: job.status,
        error: job.error,
    }))
}

async fn download(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ConvertError> {
    let job = state
        .jobs
        .get(id)
        .await
        .ok_or_else(|| ConvertError::NotFound("file not found".into()))?;

    if job.status != JobStatus::Completed {
        return Err(ConvertError::NotReady(
            "file conversion is not completed".into(),
        ));
    }

    // The record may point at a file that was removed externally.
    let path = job
        .file_path
        .filter(|p| p.is_file())
        .ok_or_else(|| ConvertError::NotFound("file not found".into()))?;

    let bytes = tokio::fs::read(&path).await?;
    let mime = mime_guess::from_path(&job.converted_name).first_or_octet_stream();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        job.converted_name.replace('"', "_")
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

async fn list_conversions(State(state): State<ApiState>) -> Json<Vec<JobSummary>> {
    let jobs = state.jobs.list().await;
    Json(jobs.iter().map(JobSummary::from_job).collect())
}

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// Pull the single `file` field out of the multipart body, enforcing the
/// payload cap while streaming.
async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<Upload, ConvertError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ConvertError::invalid(format!("unreadable multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = std::path::Path::new(field.file_name().unwrap_or("upload"))
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ConvertError::invalid(format!("failed to read upload: {e}")))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > max_bytes {
                return Err(ConvertError::invalid(format!(
                    "file exceeds the {max_bytes}-byte upload limit"
                )));
            }
        }

        if bytes.is_empty() {
            return Err(ConvertError::invalid("no file uploaded"));
        }
        return Ok(Upload { file_name, bytes });
    }

    Err(ConvertError::invalid("no file uploaded"))
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"];

/// Validate the upload's extension for the requested kind and derive the
/// artifact name from its stem.
fn converted_name_for(kind: JobKind, file_name: &str) -> Result<String, ConvertError> {
    let lower = file_name.to_lowercase();
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("converted");

    match kind {
        JobKind::DocumentToText => {
            if !lower.ends_with(".pdf") {
                return Err(ConvertError::invalid("file must be a PDF"));
            }
            Ok(format!("{stem}.txt"))
        }
        JobKind::TextToDocument => {
            if !lower.ends_with(".txt") {
                return Err(ConvertError::invalid("file must be a TXT file"));
            }
            Ok(format!("{stem}.pdf"))
        }
        JobKind::ImageReencode => {
            let ext = lower.rsplit('.').next().unwrap_or("");
            if !IMAGE_EXTENSIONS.contains(&ext) || !lower.contains('.') {
                return Err(ConvertError::invalid("file must be a supported image"));
            }
            Ok(format!("{stem}.png"))
        }
        JobKind::RemoteVideoFetch => {
            Err(ConvertError::invalid("remote fetches take a URL, not a file"))
        }
    }
}

/// Converters are CPU-bound; keep them off the async workers.
async fn run_converter(
    kind: JobKind,
    file_name: String,
    input: Vec<u8>,
) -> Result<Vec<u8>, ConvertError> {
    let handle = tokio::task::spawn_blocking(move || match kind {
        JobKind::DocumentToText => convert::pdf::pdf_to_text(&file_name, &input),
        JobKind::TextToDocument => {
            let text = String::from_utf8(input)
                .map_err(|_| ConvertError::invalid("file must be UTF-8 text"))?;
            convert::document::text_to_pdf(&text)
        }
        JobKind::ImageReencode => convert::image::reencode_to_png(&input),
        JobKind::RemoteVideoFetch => {
            Err(ConvertError::invalid("remote fetches take a URL, not a file"))
        }
    });

    handle
        .await
        .map_err(|e| ConvertError::Internal(format!("converter task failed: {e}")))?
}
