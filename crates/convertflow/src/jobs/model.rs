use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked conversion request and its current disposition.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub id: u64,
    /// Source file name, or the source URL for remote fetches.
    pub original_name: String,
    /// Name assigned to the produced artifact.
    pub converted_name: String,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Present once an attempt has been made to write output, regardless of
    /// whether that attempt succeeded.
    pub file_path: Option<PathBuf>,
    /// Non-empty only when `status` is `Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub original_size: Option<u64>,
    pub converted_size: Option<u64>,
    pub conversion_time_ms: Option<u64>,
}

/// Fields the caller supplies at creation; everything left `None` gets the
/// store's defaults.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub original_name: String,
    pub converted_name: String,
    pub kind: JobKind,
    /// Defaults to [`JobStatus::Pending`]. Synchronous conversions that
    /// finish before the record exists pass `Completed` here.
    pub status: Option<JobStatus>,
    pub file_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// Partial metrics update. Per-field override-if-present, preserve-if-absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsPatch {
    pub original_size: Option<u64>,
    pub converted_size: Option<u64>,
    pub conversion_time_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` permit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    DocumentToText,
    TextToDocument,
    ImageReencode,
    RemoteVideoFetch,
}

impl JobKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "document-to-text" => Some(Self::DocumentToText),
            "text-to-document" => Some(Self::TextToDocument),
            "image-reencode" => Some(Self::ImageReencode),
            "remote-video-fetch" => Some(Self::RemoteVideoFetch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentToText => "document-to-text",
            Self::TextToDocument => "text-to-document",
            Self::ImageReencode => "image-reencode",
            Self::RemoteVideoFetch => "remote-video-fetch",
        }
    }
}
