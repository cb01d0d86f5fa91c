//! Duration reconciliation.
//!
//! The lip-sync pipeline expects the video to cover the whole audio track.
//! Before inference the video is trimmed, looped, or cropped so that its
//! length matches the audio's, accounting for a configurable start offset
//! expressed in frames.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

/// Frame rate the pipeline operates at; start offsets are given in frames
/// at this rate.
pub const PIPELINE_FPS: f64 = 25.0;

/// Fixed pad added to the audio length before comparing against the video.
/// Carried over from the original pipeline, where it is undocumented.
pub const AUDIO_PAD_SECS: f64 = 2.0;

/// How the video length is adjusted to reach the target duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthAdjustment {
    /// Video already matches the target.
    Keep,
    /// Video is longer than the target: cut it down from the start.
    Trim,
    /// Video is shorter: tile it `extra_loops + 1` times, then cut down.
    Loop {
        /// Number of additional playthroughs appended to the first.
        extra_loops: u32,
    },
}

/// A computed reconciliation plan.
///
/// Pure data: computing the plan performs no I/O, so the policy is
/// unit-testable independent of ffmpeg.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    /// Start offset in seconds, wrapped into the video's duration.
    pub start_time: f64,
    /// Duration the video must end up with.
    pub target_duration: f64,
    /// Length adjustment to apply.
    pub adjustment: LengthAdjustment,
}

impl ReconcilePlan {
    /// Compute the plan for a given audio/video duration pair and start
    /// offset in frames.
    ///
    /// `video_duration` must be positive.
    pub fn compute(audio_duration: f64, video_duration: f64, start_frame: u32) -> Self {
        let mut start_time = start_frame as f64 / PIPELINE_FPS;
        // The video is loop-able from any frame: wrap offsets past the end.
        if start_time > video_duration {
            start_time %= video_duration;
        }

        let target_duration = audio_duration + AUDIO_PAD_SECS + start_time;

        let adjustment = if target_duration < video_duration {
            LengthAdjustment::Trim
        } else if target_duration > video_duration {
            LengthAdjustment::Loop {
                extra_loops: (target_duration / video_duration) as u32,
            }
        } else {
            LengthAdjustment::Keep
        };

        Self {
            start_time,
            target_duration,
            adjustment,
        }
    }

    /// Crop point, if a non-zero start offset was requested.
    pub fn crop_start(&self) -> Option<f64> {
        (self.start_time > 0.0).then_some(self.start_time)
    }
}

/// Reconcile a video's duration to an audio track.
///
/// Probes the video, computes the plan, and applies it with ffmpeg inside
/// `work_dir`. Returns the path of the reconciled video (the input path
/// itself when nothing had to change).
pub async fn reconcile_duration(
    video: impl AsRef<Path>,
    work_dir: impl AsRef<Path>,
    audio_duration: f64,
    start_frame: u32,
) -> MediaResult<PathBuf> {
    let video = video.as_ref();
    let work_dir = work_dir.as_ref();

    let video_duration = probe_duration(video).await?;
    if video_duration <= 0.0 {
        return Err(MediaError::InvalidMedia(format!(
            "Video has no duration: {}",
            video.display()
        )));
    }

    let plan = ReconcilePlan::compute(audio_duration, video_duration, start_frame);
    debug!(
        "Reconcile plan for {}: video {:.2}s, audio {:.2}s -> {:?}",
        video.display(),
        video_duration,
        audio_duration,
        plan
    );

    apply_plan(video, work_dir, &plan).await
}

/// Apply a reconciliation plan with ffmpeg.
async fn apply_plan(video: &Path, work_dir: &Path, plan: &ReconcilePlan) -> MediaResult<PathBuf> {
    let runner = FfmpegRunner::new();
    let mut current = video.to_path_buf();

    match plan.adjustment {
        LengthAdjustment::Keep => {}
        LengthAdjustment::Trim => {
            current = trim(&runner, &current, work_dir, "video_trimmed.mp4", plan.target_duration)
                .await?;
        }
        LengthAdjustment::Loop { extra_loops } => {
            let looped = work_dir.join("video_looped.mp4");
            let cmd = FfmpegCommand::new(&current, &looped)
                .stream_loop(extra_loops)
                .codec_copy();
            runner.run(&cmd).await?;

            current =
                trim(&runner, &looped, work_dir, "video_trimmed.mp4", plan.target_duration).await?;
        }
    }

    if let Some(start) = plan.crop_start() {
        // Re-encode from the crop point; stream copy would snap to the
        // nearest keyframe.
        let cropped = work_dir.join("video_cropped.mp4");
        let cmd = FfmpegCommand::new(&current, &cropped)
            .seek(start)
            .video_codec("libx264")
            .crf(0);
        runner.run(&cmd).await?;

        current =
            trim(&runner, &cropped, work_dir, "video_final.mp4", plan.target_duration).await?;
    }

    info!(
        "Reconciled {} -> {} (target {:.2}s)",
        video.display(),
        current.display(),
        plan.target_duration
    );

    Ok(current)
}

/// Stream-copy the video cut down to `duration` seconds.
async fn trim(
    runner: &FfmpegRunner,
    input: &Path,
    work_dir: &Path,
    name: &str,
    duration: f64,
) -> MediaResult<PathBuf> {
    let output = work_dir.join(name);
    let cmd = FfmpegCommand::new(input, &output)
        .duration(duration)
        .codec_copy();
    runner.run(&cmd).await?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_when_video_longer() {
        // video=10s, audio=5s, start_frame=0 -> target=7s -> trim
        let plan = ReconcilePlan::compute(5.0, 10.0, 0);
        assert_eq!(plan.adjustment, LengthAdjustment::Trim);
        assert!((plan.target_duration - 7.0).abs() < 1e-9);
        assert_eq!(plan.crop_start(), None);
    }

    #[test]
    fn test_loop_when_video_shorter() {
        // video=5s, audio=10s, start_frame=0 -> target=12s -> 3 playthroughs
        let plan = ReconcilePlan::compute(10.0, 5.0, 0);
        match plan.adjustment {
            LengthAdjustment::Loop { extra_loops } => {
                assert_eq!(extra_loops, 2);
                // Tiled length must cover the target before trimming
                assert!((extra_loops as f64 + 1.0) * 5.0 >= plan.target_duration);
            }
            other => panic!("expected loop, got {:?}", other),
        }
        assert!((plan.target_duration - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_keep_on_exact_match() {
        // target = 3 + 2 + 0 = 5 == video
        let plan = ReconcilePlan::compute(3.0, 5.0, 0);
        assert_eq!(plan.adjustment, LengthAdjustment::Keep);
    }

    #[test]
    fn test_start_frame_wraps_past_video_end() {
        // start_frame=250 -> 10s, video=8s -> wraps to 2s
        let plan = ReconcilePlan::compute(5.0, 8.0, 250);
        assert!((plan.start_time - 2.0).abs() < 1e-9);
        assert_eq!(plan.crop_start(), Some(plan.start_time));
        // target = 5 + 2 + 2 = 9 > 8 -> loop
        assert!(matches!(plan.adjustment, LengthAdjustment::Loop { .. }));
    }

    #[test]
    fn test_start_time_always_in_range() {
        let video_duration = 8.0;
        for start_frame in (0..2000).step_by(7) {
            let plan = ReconcilePlan::compute(5.0, video_duration, start_frame);
            assert!(
                plan.start_time >= 0.0 && plan.start_time <= video_duration,
                "start_frame {} produced out-of-range start_time {}",
                start_frame,
                plan.start_time
            );
        }
    }

    #[test]
    fn test_exactly_one_adjustment_chosen() {
        let cases = [(5.0, 10.0), (10.0, 5.0), (3.0, 5.0), (0.1, 100.0), (100.0, 0.5)];
        for (audio, video) in cases {
            let plan = ReconcilePlan::compute(audio, video, 0);
            let target = audio + AUDIO_PAD_SECS;
            match plan.adjustment {
                LengthAdjustment::Trim => assert!(target < video),
                LengthAdjustment::Loop { .. } => assert!(target > video),
                LengthAdjustment::Keep => assert!((target - video).abs() < f64::EPSILON),
            }
        }
    }

    #[test]
    fn test_zero_start_frame_never_crops() {
        let plan = ReconcilePlan::compute(30.0, 12.0, 0);
        assert_eq!(plan.crop_start(), None);
    }
}
