//! Remote video retrieval.
//!
//! Metadata resolution and the byte transfer sit behind [`VideoProvider`] so
//! the job lifecycle can be exercised with a stub. The production provider
//! resolves metadata by shelling out to `yt-dlp` and streams the chosen
//! format's URL to disk with reqwest.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::ConvertError;

/// One downloadable encoding of a video.
#[derive(Debug, Clone)]
pub struct VideoFormat {
    pub format_id: String,
    pub url: String,
    /// Container extension, e.g. `mp4` or `webm`.
    pub container: String,
    pub has_audio: bool,
    pub has_video: bool,
    /// Vertical resolution, when the provider reports one.
    pub height: Option<u32>,
}

/// Resolved metadata for a remote video.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub title: String,
    pub formats: Vec<VideoFormat>,
}

/// The two provider-side operations of the remote-fetch path.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Resolve the video's title and available formats.
    async fn metadata(&self, url: &str) -> Result<VideoMetadata, ConvertError>;

    /// Transfer one format to `dest`, returning the number of bytes written.
    async fn download(&self, format: &VideoFormat, dest: &Path) -> Result<u64, ConvertError>;
}

/// Pick the best combined audio+video format, falling back to the best
/// video-only encoding if no combined one exists.
pub fn choose_format(formats: &[VideoFormat]) -> Option<&VideoFormat> {
    formats
        .iter()
        .filter(|f| f.has_audio && f.has_video)
        .max_by_key(|f| f.height.unwrap_or(0))
        .or_else(|| {
            formats
                .iter()
                .filter(|f| f.has_video)
                .max_by_key(|f| f.height.unwrap_or(0))
        })
}

/// Syntactic check that a URL points at the expected provider.
pub fn is_provider_url(url: &str) -> bool {
    let rest = match url.split_once("://") {
        Some(("http" | "https", rest)) => rest,
        _ => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = host.split('@').last().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    host == "youtube.com" || host.ends_with(".youtube.com") || host == "youtu.be"
}

/// Build a collision-resistant artifact name from the video title. The
/// appended creation timestamp keeps two jobs for the same nominal title
/// from sharing a target file.
pub fn synthesize_file_name(title: &str, container: &str) -> String {
    let mut stem: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    stem.truncate(100);
    if stem.is_empty() {
        stem.push_str("video");
    }
    format!("{}_{}.{}", stem, Utc::now().timestamp_millis(), container)
}

// Some video CDNs refuse the default library agent; present a desktop
// browser instead.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Production provider: `yt-dlp -j` for metadata, reqwest for the transfer.
pub struct YtDlpProvider {
    bin: String,
    client: reqwest::Client,
}

impl YtDlpProvider {
    pub fn new(bin: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            bin: bin.into(),
            client,
        }
    }
}

#[async_trait]
impl VideoProvider for YtDlpProvider {
    async fn metadata(&self, url: &str) -> Result<VideoMetadata, ConvertError> {
        let output = tokio::process::Command::new(&self.bin)
            .arg("--no-playlist")
            .arg("-j")
            .arg(url)
            .output()
            .await
            .map_err(|e| {
                ConvertError::upstream(format!("failed to run {}: {e}", self.bin))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().last().unwrap_or("no output").trim();
            return Err(ConvertError::upstream(format!(
                "metadata resolution failed: {reason}"
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ConvertError::upstream(format!("unreadable metadata: {e}")))?;
        Ok(parse_metadata(&value))
    }

    async fn download(&self, format: &VideoFormat, dest: &Path) -> Result<u64, ConvertError> {
        debug!(format_id = %format.format_id, dest = %dest.display(), "starting transfer");

        let mut response = self
            .client
            .get(&format.url)
            .send()
            .await?
            .error_for_status()?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

/// Map `yt-dlp -j` output onto our format list. Entries without a direct
/// URL (storyboards, manifests) are skipped.
fn parse_metadata(value: &serde_json::Value) -> VideoMetadata {
    let title = value["title"].as_str().unwrap_or("video").to_string();

    let formats = value["formats"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|f| {
                    let url = f["url"].as_str()?;
                    Some(VideoFormat {
                        format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                        url: url.to_string(),
                        container: f["ext"].as_str().unwrap_or("mp4").to_string(),
                        has_audio: codec_present(&f["acodec"]),
                        has_video: codec_present(&f["vcodec"]),
                        height: f["height"].as_u64().map(|h| h as u32),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    VideoMetadata { title, formats }
}

fn codec_present(codec: &serde_json::Value) -> bool {
    matches!(codec.as_str(), Some(c) if !c.is_empty() && c != "none")
}
