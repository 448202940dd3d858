//! Fixed-cadence frame sampling.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};

/// A decoded still frame on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    /// Position in the sampled sequence
    pub index: usize,
    /// Whole seconds from the start of the video
    pub timestamp: u32,
    pub path: PathBuf,
}

/// Lazily extracts one frame per `interval` seconds, from `t = 0` while `t < floor(duration)`.
///
/// Frames are decoded one at a time as the sequence is consumed; the sampler
/// cannot be rewound.
pub struct FrameSampler {
    engine: Arc<dyn MediaEngine>,
    video_path: PathBuf,
    out_dir: PathBuf,
    interval: u32,
    end: u32,
    next_index: usize,
}

impl FrameSampler {
    /// Create a sampler for a video whose duration is already known.
    pub async fn new(
        engine: Arc<dyn MediaEngine>,
        video_path: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
        duration_secs: f64,
        interval_secs: u32,
    ) -> MediaResult<Self> {
        if interval_secs == 0 {
            return Err(MediaError::internal("frame sampling interval must be positive"));
        }
        let out_dir = out_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&out_dir).await?;

        let end = if duration_secs.is_finite() && duration_secs > 0.0 {
            duration_secs.floor() as u32
        } else {
            0
        };

        Ok(Self {
            engine,
            video_path: video_path.as_ref().to_path_buf(),
            out_dir,
            interval: interval_secs,
            end,
            next_index: 0,
        })
    }

    /// Probe the video and create a sampler over its full duration.
    pub async fn open(
        engine: Arc<dyn MediaEngine>,
        video_path: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
        interval_secs: u32,
    ) -> MediaResult<Self> {
        let info = engine.probe(video_path.as_ref()).await?;
        Self::new(engine, video_path, out_dir, info.duration, interval_secs).await
    }

    /// Total number of frames the sequence will yield.
    pub fn frame_count(&self) -> usize {
        self.end.div_ceil(self.interval) as usize
    }

    /// Index of the next frame to be yielded.
    pub fn position(&self) -> usize {
        self.next_index
    }

    /// Decode and return the next frame, or `None` once the sequence is exhausted.
    pub async fn next_frame(&mut self) -> Option<MediaResult<FrameRef>> {
        if self.next_index >= self.frame_count() {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;

        let timestamp = index as u32 * self.interval;
        let path = self.out_dir.join(frame_filename(timestamp));

        debug!(timestamp, "Extracting frame");
        let result = self
            .engine
            .extract_frame(&self.video_path, timestamp as f64, &path)
            .await
            .and_then(|_| {
                if path.exists() {
                    Ok(())
                } else {
                    Err(MediaError::Decode(format!("no frame at {}s", timestamp)))
                }
            });

        Some(result.map(|_| FrameRef {
            index,
            timestamp,
            path,
        }))
    }
}

/// `frame_000040.png` for t = 40.
pub fn frame_filename(timestamp: u32) -> String {
    format!("frame_{:06}.png", timestamp)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::probe::VideoInfo;
    use async_trait::async_trait;
    use clipforge_models::AspectRatio;
    use image::RgbImage;

    /// Renders frames from a closure instead of decoding video.
    pub struct SyntheticEngine {
        pub duration: f64,
        pub render: Box<dyn Fn(u32) -> RgbImage + Send + Sync>,
    }

    #[async_trait]
    impl MediaEngine for SyntheticEngine {
        async fn probe(&self, _video: &Path) -> MediaResult<VideoInfo> {
            Ok(VideoInfo {
                duration: self.duration,
                width: 1000,
                height: 500,
                frame_rate: None,
                codec: "synthetic".into(),
                has_audio: false,
            })
        }

        async fn extract_frame(&self, _video: &Path, timestamp: f64, output: &Path) -> MediaResult<()> {
            (self.render)(timestamp as u32).save(output)?;
            Ok(())
        }

        async fn cut(&self, _: &Path, _: f64, _: f64, _: &Path) -> MediaResult<()> {
            unimplemented!()
        }

        async fn reframe(&self, _: &Path, _: AspectRatio, _: &Path) -> MediaResult<()> {
            unimplemented!()
        }

        async fn burn_captions(&self, _: &Path, _: &Path, _: &Path) -> MediaResult<()> {
            unimplemented!()
        }

        async fn extract_audio(&self, _: &Path, _: &Path) -> MediaResult<()> {
            unimplemented!()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::SyntheticEngine;
    use super::*;
    use image::RgbImage;

    fn engine(duration: f64) -> Arc<dyn MediaEngine> {
        Arc::new(SyntheticEngine {
            duration,
            render: Box::new(|_| RgbImage::new(8, 8)),
        })
    }

    #[tokio::test]
    async fn test_samples_each_second_below_floor_duration() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = FrameSampler::open(engine(5.7), "in.mp4", dir.path().join("frames"), 1)
            .await
            .unwrap();
        assert_eq!(sampler.frame_count(), 5);

        let mut timestamps = Vec::new();
        while let Some(frame) = sampler.next_frame().await {
            let frame = frame.unwrap();
            assert!(frame.path.exists());
            assert_eq!(frame.path.file_name().unwrap(), frame_filename(frame.timestamp).as_str());
            timestamps.push(frame.timestamp);
        }
        assert_eq!(timestamps, vec![0, 1, 2, 3, 4]);
        assert!(sampler.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_interval_and_short_video() {
        let dir = tempfile::tempdir().unwrap();
        let sampler = FrameSampler::new(engine(10.0), "in.mp4", dir.path(), 10.0, 3)
            .await
            .unwrap();
        assert_eq!(sampler.frame_count(), 4); // 0, 3, 6, 9

        let mut empty = FrameSampler::new(engine(0.4), "in.mp4", dir.path(), 0.4, 1)
            .await
            .unwrap();
        assert_eq!(empty.frame_count(), 0);
        assert!(empty.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FrameSampler::new(engine(10.0), "in.mp4", dir.path(), 10.0, 0)
            .await
            .is_err());
    }
}
