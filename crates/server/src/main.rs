use std::sync::Arc;

use convertflow::api::{self, ApiState};
use convertflow::convert::YtDlpProvider;
use convertflow::{Config, JobStore, TransferRunner};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env()?;

    let uploads_dir = cfg.uploads_dir();
    let downloads_dir = cfg.downloads_dir();
    std::fs::create_dir_all(&uploads_dir)?;
    std::fs::create_dir_all(&downloads_dir)?;

    let jobs = JobStore::new();
    let provider = Arc::new(YtDlpProvider::new(cfg.ytdlp_bin.clone()));
    let runner = TransferRunner::new(jobs.clone(), provider, downloads_dir.clone());

    let app = api::router(ApiState {
        jobs,
        runner,
        uploads_dir,
        downloads_dir,
        max_upload_bytes: cfg.max_upload_bytes,
    });

    info!(
        addr = %cfg.listen_addr,
        data_dir = %cfg.data_dir.display(),
        max_upload_bytes = cfg.max_upload_bytes,
        "convertflow starting"
    );

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
