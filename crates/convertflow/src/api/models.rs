use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jobs::{ConversionJob, JobKind, JobStatus};

#[derive(Debug, Deserialize)]
pub struct RemoteVideoRequest {
    pub url: String,
}

/// Successful response for every `/convert/...` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub id: u64,
    pub converted_file_name: String,
    pub download_url: String,
}

impl ConversionResponse {
    pub fn from_job(job: &ConversionJob) -> Self {
        Self {
            id: job.id,
            converted_file_name: job.converted_name.clone(),
            download_url: format!("/download/{}", job.id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: u64,
    pub status: JobStatus,
    pub error: Option<String>,
}

/// One row of `GET /conversions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: u64,
    pub original_name: String,
    pub converted_name: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub original_size: Option<u64>,
    pub converted_size: Option<u64>,
    pub conversion_time_ms: Option<u64>,
}

impl JobSummary {
    pub fn from_job(job: &ConversionJob) -> Self {
        Self {
            id: job.id,
            original_name: job.original_name.clone(),
            converted_name: job.converted_name.clone(),
            kind: job.kind,
            status: job.status,
            created_at: job.created_at,
            original_size: job.original_size,
            converted_size: job.converted_size,
            conversion_time_ms: job.conversion_time_ms,
        }
    }
}
