//! File-conversion service: per-format converters, an in-memory job store,
//! and the HTTP surface that ties them together. The remote-video path is
//! asynchronous; the endpoint answers as soon as the job record exists and
//! the transfer settles in the background.

pub mod api;
pub mod config;
pub mod convert;
pub mod error;
pub mod jobs;

pub use config::Config;
pub use error::ConvertError;
pub use jobs::{ConversionJob, JobKind, JobStatus, JobStore, TransferRunner};
