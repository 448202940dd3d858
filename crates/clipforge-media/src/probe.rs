//! FFprobe video information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Frame rate as an exact `numerator/denominator` pair.
///
/// FFprobe reports rates like `30000/1001`; they are parsed, never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> MediaResult<Self> {
        if den == 0 {
            return Err(MediaError::InvalidFrameRate(format!("{}/{}", num, den)));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for FrameRate {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || MediaError::InvalidFrameRate(s.to_string());
        let (num, den) = match s.split_once('/') {
            Some((num, den)) => (num.trim(), den.trim()),
            None => (s, "1"),
        };
        let num: u32 = num.parse().map_err(|_| invalid())?;
        let den: u32 = den.parse().map_err(|_| invalid())?;
        Self::new(num, den)
    }
}

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate, when the container reports a usable one
    pub frame_rate: Option<FrameRate>,
    /// Video codec
    pub codec: String,
    /// Whether an audio stream is present
    pub has_audio: bool,
}

impl VideoInfo {
    /// Reject sources the pipeline cannot process.
    pub fn check_processable(&self, max_duration_secs: f64) -> MediaResult<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(MediaError::invalid_video("video has no measurable duration"));
        }
        if self.duration > max_duration_secs {
            return Err(MediaError::invalid_video(format!(
                "video is {:.0}s long; the limit is {:.0}s",
                self.duration, max_duration_secs
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(MediaError::invalid_video("video has no usable resolution"));
        }
        Ok(())
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe a video file for information.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ToolFailed {
            tool: "ffprobe",
            message: "file is corrupted or unsupported".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            exit_code: output.status.code(),
        });
    }

    parse_probe_output(&output.stdout)
}

fn parse_probe_output(raw: &[u8]) -> MediaResult<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(raw)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::invalid_video("No video stream found"))?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    // "0/0" is how ffprobe spells "unknown"; fall through to the next candidate.
    let frame_rate = [&video_stream.r_frame_rate, &video_stream.avg_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|r| r.parse::<FrameRate>().ok().filter(|fr| fr.num > 0));

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        frame_rate,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
        has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
    })
}
