//! The asynchronous remote-fetch lifecycle.
//!
//! `begin` resolves the source and creates the job record, then returns;
//! the caller answers the client while the transfer runs in a spawned task.
//! That task is the sole writer of the job's terminal state, and every way
//! it can end funnels into exactly one `update_status` call, so a `pending`
//! job can never dangle short of process death.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::convert::video::{
    choose_format, is_provider_url, synthesize_file_name, VideoFormat, VideoProvider,
};
use crate::error::ConvertError;
use crate::jobs::model::{ConversionJob, JobKind, JobStatus, MetricsPatch, NewJob};
use crate::jobs::store::JobStore;

#[derive(Clone)]
pub struct TransferRunner {
    store: JobStore,
    provider: Arc<dyn VideoProvider>,
    downloads_dir: PathBuf,
}

impl TransferRunner {
    pub fn new(store: JobStore, provider: Arc<dyn VideoProvider>, downloads_dir: PathBuf) -> Self {
        Self {
            store,
            provider,
            downloads_dir,
        }
    }

    /// Start a remote fetch.
    ///
    /// A syntactically bad URL fails without creating a record. A URL that
    /// resolves to no usable metadata or format creates the job directly as
    /// `Failed`: the call still succeeds and the client observes the
    /// failure by polling. Otherwise the job is returned while still
    /// `Pending` and the transfer continues in the background.
    pub async fn begin(&self, url: &str) -> Result<ConversionJob, ConvertError> {
        if !is_provider_url(url) {
            return Err(ConvertError::invalid("invalid video URL"));
        }

        let metadata = match self.provider.metadata(url).await {
            Ok(m) => m,
            Err(e) => {
                warn!(url, error = %e, "metadata resolution failed");
                return Ok(self.create_failed(url, String::new(), &e.to_string()).await);
            }
        };

        let Some(format) = choose_format(&metadata.formats).cloned() else {
            let converted_name = synthesize_file_name(&metadata.title, "mp4");
            return Ok(self
                .create_failed(url, converted_name, "no suitable video format found")
                .await);
        };

        let converted_name = synthesize_file_name(&metadata.title, &format.container);
        let dest = self.downloads_dir.join(&converted_name);

        let job = self
            .store
            .create(NewJob {
                original_name: url.to_string(),
                converted_name,
                kind: JobKind::RemoteVideoFetch,
                status: None,
                file_path: Some(dest.clone()),
                error: None,
            })
            .await;

        info!(job_id = job.id, url, format_id = %format.format_id, "transfer scheduled");

        let store = self.store.clone();
        let provider = Arc::clone(&self.provider);
        let job_id = job.id;
        tokio::spawn(async move {
            run_transfer(store, provider, job_id, format, dest).await;
        });

        Ok(job)
    }

    async fn create_failed(&self, url: &str, converted_name: String, error: &str) -> ConversionJob {
        self.store
            .create(NewJob {
                original_name: url.to_string(),
                converted_name,
                kind: JobKind::RemoteVideoFetch,
                status: Some(JobStatus::Failed),
                file_path: None,
                error: Some(error.to_string()),
            })
            .await
    }
}

/// Drive one transfer to its terminal state. No early return sits between
/// the download and the final `update_status`; update results are ignored
/// because nobody is waiting on this path anymore.
async fn run_transfer(
    store: JobStore,
    provider: Arc<dyn VideoProvider>,
    job_id: u64,
    format: VideoFormat,
    dest: PathBuf,
) {
    store
        .update_status(job_id, JobStatus::Processing, None)
        .await;

    let started = Instant::now();
    let outcome = provider.download(&format, &dest).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(written) => {
            store
                .update_metrics(
                    job_id,
                    MetricsPatch {
                        converted_size: Some(written),
                        conversion_time_ms: Some(elapsed_ms),
                        ..Default::default()
                    },
                )
                .await;
            store
                .update_status(job_id, JobStatus::Completed, None)
                .await;
            info!(job_id, bytes = written, elapsed_ms, "transfer completed");
        }
        Err(e) => {
            store
                .update_status(job_id, JobStatus::Failed, Some(&e.to_string()))
                .await;
            warn!(job_id, elapsed_ms, error = %e, "transfer failed");
        }
    }
}
