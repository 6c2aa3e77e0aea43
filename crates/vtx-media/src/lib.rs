//! FFmpeg CLI wrapper for the transcode profile.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building, including the fixed encoding profile
//! - The `Encoder` capability used by the worker pipeline
//! - `FfmpegEncoder`, which runs the binary with stderr passthrough and an optional timeout

pub mod command;
pub mod encoder;
pub mod error;

pub use command::{check_ffmpeg, resolve_ffmpeg, FfmpegCommand};
pub use encoder::{EncodeOutcome, Encoder, FfmpegEncoder};
pub use error::{MediaError, MediaResult};
