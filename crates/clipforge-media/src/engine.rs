//! Decode/encode engine used by the pipeline.
//!
//! `MediaEngine` is the narrow contract the worker calls; `FfmpegEngine`
//! fulfils it with the `ffmpeg`/`ffprobe` CLIs.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use clipforge_models::AspectRatio;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::{caption_filter, reframe_filter, ReframePlan};
use crate::probe::{probe_video, VideoInfo};

/// Operations the pipeline needs from a decode/encode engine.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Read duration, resolution and frame rate.
    async fn probe(&self, video: &Path) -> MediaResult<VideoInfo>;

    /// Decode the frame at `timestamp` seconds into an image file.
    async fn extract_frame(&self, video: &Path, timestamp: f64, output: &Path) -> MediaResult<()>;

    /// Re-encode `[start, start + duration)` into a standalone clip.
    async fn cut(&self, video: &Path, start: f64, duration: f64, output: &Path) -> MediaResult<()>;

    /// Scale to cover and center-crop to the target geometry.
    async fn reframe(&self, input: &Path, target: AspectRatio, output: &Path) -> MediaResult<()>;

    /// Burn an SRT caption track into the video.
    async fn burn_captions(&self, input: &Path, srt: &Path, output: &Path) -> MediaResult<()>;

    /// Extract the audio track as MP3.
    async fn extract_audio(&self, input: &Path, output: &Path) -> MediaResult<()>;
}

/// FFmpeg-backed engine.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
    video_codec: String,
    audio_codec: String,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self {
            runner: FfmpegRunner::new(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any single FFmpeg invocation that exceeds `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }

    fn encode(&self, cmd: FfmpegCommand) -> FfmpegCommand {
        cmd.video_codec(&self.video_codec)
            .audio_codec(&self.audio_codec)
            .output_arg("-movflags")
            .output_arg("+faststart")
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, video: &Path) -> MediaResult<VideoInfo> {
        probe_video(video).await
    }

    async fn extract_frame(&self, video: &Path, timestamp: f64, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(video, output).seek(timestamp).single_frame();
        self.runner.run(&cmd).await
    }

    async fn cut(&self, video: &Path, start: f64, duration: f64, output: &Path) -> MediaResult<()> {
        let cmd = self.encode(FfmpegCommand::new(video, output).seek(start).duration(duration));
        self.runner.run(&cmd).await?;
        info!("Cut {:.1}s - {:.1}s into {}", start, start + duration, output.display());
        Ok(())
    }

    async fn reframe(&self, input: &Path, target: AspectRatio, output: &Path) -> MediaResult<()> {
        let info = probe_video(input).await?;
        let plan = ReframePlan::compute((info.width, info.height), target);
        debug!(
            source = ?(info.width, info.height),
            scaled = ?plan.scaled,
            crop_origin = ?plan.crop_origin,
            "Reframing to {}",
            target
        );
        let cmd = self.encode(FfmpegCommand::new(input, output).video_filter(reframe_filter(&plan)));
        self.runner.run(&cmd).await
    }

    async fn burn_captions(&self, input: &Path, srt: &Path, output: &Path) -> MediaResult<()> {
        let filter = caption_filter(&srt.to_string_lossy());
        let cmd = self.encode(FfmpegCommand::new(input, output).video_filter(filter));
        self.runner.run(&cmd).await
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(input, output)
            .no_video()
            .audio_codec("libmp3lame");
        self.runner.run(&cmd).await
    }
}
