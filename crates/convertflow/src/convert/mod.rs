//! Format-specific conversion routines.
//!
//! Each converter is a function from input bytes to output bytes (or a
//! fatal failure); the remote-video path is a trait so the transfer can be
//! stubbed in tests.

pub mod document;
pub mod image;
pub mod pdf;
pub mod video;

pub use video::{choose_format, VideoFormat, VideoMetadata, VideoProvider, YtDlpProvider};
