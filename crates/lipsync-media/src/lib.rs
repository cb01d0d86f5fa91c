//! FFmpeg CLI wrapper for the lipsync worker.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Async subprocess execution with stderr capture
//! - Media probing via ffprobe
//! - Duration reconciliation (trim/loop/crop the video to the audio length)

pub mod command;
pub mod error;
pub mod probe;
pub mod reconcile;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_duration, probe_video, MediaInfo};
pub use reconcile::{
    reconcile_duration, LengthAdjustment, ReconcilePlan, AUDIO_PAD_SECS, PIPELINE_FPS,
};
