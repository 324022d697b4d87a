use std::path::PathBuf;

/// Runtime configuration, loaded once from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: String,
    /// Root of on-disk storage; `uploads/` and `downloads/` live beneath it.
    pub data_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Executable used to resolve remote video metadata.
    pub ytdlp_bin: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr = env_or_fallback("CONVERTFLOW_LISTEN_ADDR", "LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let data_dir = env_or_fallback("CONVERTFLOW_DATA_DIR", "DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let max_upload_bytes =
            env_or_fallback("CONVERTFLOW_MAX_UPLOAD_BYTES", "MAX_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(25 * 1024 * 1024);

        let ytdlp_bin = env_or_fallback("CONVERTFLOW_YTDLP_BIN", "YTDLP_BIN")
            .unwrap_or_else(|| "yt-dlp".to_string());

        Ok(Self {
            listen_addr,
            data_dir,
            max_upload_bytes,
            ytdlp_bin,
        })
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.data_dir.join("downloads")
    }
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}
