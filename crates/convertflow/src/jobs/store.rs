use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::jobs::model::{ConversionJob, JobStatus, MetricsPatch, NewJob};

/// Authoritative in-memory record of every conversion job for the lifetime
/// of the process. Nothing survives a restart except the artifact files on
/// disk.
///
/// Cheap to clone; handlers and background tasks each hold their own handle
/// to the shared table. Every operation takes the interior lock, so a
/// read-modify-write like [`update_status`](Self::update_status) is atomic
/// under the multi-threaded runtime.
#[derive(Debug, Clone)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<u64, ConversionJob>>>,
    next_id: Arc<AtomicU64>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Assign the next id, apply defaults, stamp `created_at`, and store the
    /// record. Ids are monotonically increasing and never reused.
    pub async fn create(&self, new: NewJob) -> ConversionJob {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let job = ConversionJob {
            id,
            original_name: new.original_name,
            converted_name: new.converted_name,
            kind: new.kind,
            status: new.status.unwrap_or(JobStatus::Pending),
            file_path: new.file_path,
            error: new.error,
            created_at: Utc::now(),
            original_size: None,
            converted_size: None,
            conversion_time_ms: None,
        };
        self.inner.write().await.insert(id, job.clone());
        job
    }

    pub async fn get(&self, id: u64) -> Option<ConversionJob> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Replace the status, and set `error` only when one is provided; a
    /// `None` here never clears a previously recorded error.
    ///
    /// Unknown ids are a silent no-op returning `None`: the background
    /// completion path has no caller left to report to.
    pub async fn update_status(
        &self,
        id: u64,
        status: JobStatus,
        error: Option<&str>,
    ) -> Option<ConversionJob> {
        let mut guard = self.inner.write().await;
        let job = guard.get_mut(&id)?;
        job.status = status;
        if let Some(message) = error {
            job.error = Some(message.to_owned());
        }
        Some(job.clone())
    }

    /// Merge the provided metric fields into the record; fields omitted in
    /// the patch are left unchanged. Unknown ids return `None`.
    pub async fn update_metrics(&self, id: u64, patch: MetricsPatch) -> Option<ConversionJob> {
        let mut guard = self.inner.write().await;
        let job = guard.get_mut(&id)?;
        if let Some(v) = patch.original_size {
            job.original_size = Some(v);
        }
        if let Some(v) = patch.converted_size {
            job.converted_size = Some(v);
        }
        if let Some(v) = patch.conversion_time_ms {
            job.conversion_time_ms = Some(v);
        }
        Some(job.clone())
    }

    /// All jobs, in no particular order.
    pub async fn list(&self) -> Vec<ConversionJob> {
        self.inner.read().await.values().cloned().collect()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
