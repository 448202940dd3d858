//! FFmpeg command builder and runner.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Keep this many bytes of stderr for error reports.
const STDERR_TAIL_BYTES: usize = 2048;

/// One `ffmpeg` invocation: input options, `-i input`, output options, output.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    input_args: Vec<OsString>,
    output_args: Vec<OsString>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    fn input_opt(mut self, flag: &str, value: impl Into<OsString>) -> Self {
        self.input_args.push(flag.into());
        self.input_args.push(value.into());
        self
    }

    /// Append a raw output option.
    pub fn output_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Input-side seek; keyframe accuracy is enough for sampling and cuts.
    pub fn seek(self, seconds: f64) -> Self {
        self.input_opt("-ss", format!("{:.3}", seconds))
    }

    pub fn duration(self, seconds: f64) -> Self {
        self.input_opt("-t", format!("{:.3}", seconds))
    }

    pub fn video_filter(self, filter: impl Into<OsString>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn video_codec(self, codec: &str) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn audio_codec(self, codec: &str) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// Full argument vector, overwrite and quiet flags first.
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-nostdin", "-v", "error"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.extend(self.input_args.iter().cloned());
        args.push("-i".into());
        args.push(self.input.clone().into_os_string());
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.clone().into_os_string());
        args
    }
}

/// Runs FFmpeg commands to completion with an optional hard timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the process if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!(?args, "Running ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("ffmpeg stderr was not captured"))?;
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("FFmpeg timed out after {:?}, killing process", limit);
                    let _ = child.kill().await;
                    return Err(MediaError::ToolTimeout {
                        tool: "ffmpeg",
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait().await?,
        };

        let stderr = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ToolFailed {
                tool: "ffmpeg",
                message: status.to_string(),
                stderr: Some(stderr_tail(&stderr)),
                exit_code: status.code(),
            })
        }
    }
}

fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::ToolMissing("ffmpeg"))
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::ToolMissing("ffprobe"))
}
