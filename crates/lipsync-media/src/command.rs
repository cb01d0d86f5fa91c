//! ffmpeg invocation: argument building and subprocess execution.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// One ffmpeg invocation with a single input and a single output.
///
/// Arguments added before `-i` apply to the input (demuxer options such as
/// `-ss` and `-stream_loop`); everything else sits between the input and
/// the output path.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    pre_input: Vec<String>,
    post_input: Vec<String>,
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            pre_input: Vec::new(),
            post_input: Vec::new(),
            log_level: "error".into(),
        }
    }

    /// Append a raw argument before `-i`.
    pub fn pre_arg(mut self, arg: impl Into<String>) -> Self {
        self.pre_input.push(arg.into());
        self
    }

    /// Append a raw argument after `-i`.
    pub fn post_arg(mut self, arg: impl Into<String>) -> Self {
        self.post_input.push(arg.into());
        self
    }

    /// Seek to `seconds` before decoding (fast input seek).
    pub fn seek(self, seconds: f64) -> Self {
        self.pre_arg("-ss").pre_arg(format!("{:.3}", seconds))
    }

    /// Stop writing the output after `seconds`.
    pub fn duration(self, seconds: f64) -> Self {
        self.post_arg("-t").post_arg(format!("{:.3}", seconds))
    }

    /// Loop the input `count` extra times (it plays `count + 1` times).
    pub fn stream_loop(self, count: u32) -> Self {
        self.pre_arg("-stream_loop").pre_arg(count.to_string())
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.post_arg("-c").post_arg("copy")
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.post_arg("-c:v").post_arg(codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.post_arg("-c:a").post_arg(codec)
    }

    pub fn crf(self, crf: u8) -> Self {
        self.post_arg("-crf").post_arg(crf.to_string())
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Assemble the full argument vector.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
            "-nostdin".to_string(),
        ];
        args.extend(self.pre_input.iter().cloned());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(self.post_input.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }
}

/// Executes [`FfmpegCommand`]s, capturing stderr for error reporting.
pub struct FfmpegRunner {
    timeout: Option<Duration>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill the process if it runs longer than `secs` seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Run a command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("ffmpeg {}", args.join(" "));

        let pending = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| MediaError::Timeout(limit.as_secs()))??,
            None => pending.await?,
        };

        if !output.status.success() {
            return Err(MediaError::ffmpeg_failed(
                "ffmpeg exited with non-zero status",
                &output,
            ));
        }

        Ok(())
    }
}

/// Locate ffmpeg in PATH.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Locate ffprobe in PATH.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_trim() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .duration(7.0)
            .codec_copy();

        let args = cmd.build_args();
        assert!(args.contains(&"-t".to_string()));
        assert!(args.contains(&"7.000".to_string()));
        assert!(args.contains(&"-c".to_string()));
        assert!(args.contains(&"copy".to_string()));
        // Output file comes last
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[test]
    fn test_command_builder_loop_args_precede_input() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .stream_loop(2)
            .codec_copy();

        let args = cmd.build_args();
        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert!(loop_pos < input_pos);
        assert_eq!(args[loop_pos + 1], "2");
    }

    #[test]
    fn test_command_builder_crop() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .seek(2.0)
            .video_codec("libx264")
            .crf(0);

        let args = cmd.build_args();
        let seek_pos = args.iter().position(|a| a == "-ss").unwrap();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert!(seek_pos < input_pos);
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"-crf".to_string()));
    }
}
