//! End-to-end orchestrator runs against in-process collaborators.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clipforge_db::Database;
use clipforge_media::{MediaEngine, MediaError, MediaResult, TemplateSet, VideoInfo};
use clipforge_models::{AspectRatio, FilterMode, JobConfig, KillType, Video, VideoId, VideoStatus};
use clipforge_speech::{SpeechError, SpeechResult, Transcriber};
use clipforge_storage::{video_source_key, MemoryObjectStore, ObjectStore};
use clipforge_worker::{JobOrchestrator, ProcessingContext, WorkerConfig, WorkerError};
use image::{Rgb, RgbImage};
use mockall::mock;

const TRIPLE: [u8; 3] = [250, 30, 30];
const SINGLE: [u8; 3] = [30, 30, 250];
const OWNER: &str = "user_1";

mock! {
    pub Speech {}

    #[async_trait]
    impl Transcriber for Speech {
        async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> SpeechResult<String>;
    }
}

/// Renders a 1000x500 frame per timestamp and fakes every encode step.
struct FakeEngine {
    duration: f64,
    kills: Vec<(u32, [u8; 3])>,
    failing_cut_starts: HashSet<u32>,
    frame_delay_ms: AtomicU64,
    frames: AtomicUsize,
    cuts: AtomicUsize,
    reframes: AtomicUsize,
    burns: AtomicUsize,
}

impl FakeEngine {
    fn new(duration: f64, kills: Vec<(u32, [u8; 3])>) -> Self {
        Self {
            duration,
            kills,
            failing_cut_starts: HashSet::new(),
            frame_delay_ms: AtomicU64::new(0),
            frames: AtomicUsize::new(0),
            cuts: AtomicUsize::new(0),
            reframes: AtomicUsize::new(0),
            burns: AtomicUsize::new(0),
        }
    }

    fn failing_cut_at(mut self, start: u32) -> Self {
        self.failing_cut_starts.insert(start);
        self
    }

    fn set_frame_delay(&self, delay: Duration) {
        self.frame_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn render(&self, timestamp: u32) -> RgbImage {
        let mut img = RgbImage::new(1000, 500);
        if let Some((_, color)) = self.kills.iter().find(|(t, _)| *t == timestamp) {
            for y in 25..125 {
                for x in 650..950 {
                    img.put_pixel(x, y, Rgb(*color));
                }
            }
        }
        img
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn probe(&self, video: &Path) -> MediaResult<VideoInfo> {
        if !video.exists() {
            return Err(MediaError::invalid_video("source missing"));
        }
        Ok(VideoInfo {
            duration: self.duration,
            width: 1000,
            height: 500,
            frame_rate: None,
            codec: "h264".into(),
            has_audio: true,
        })
    }

    async fn extract_frame(&self, _video: &Path, timestamp: f64, output: &Path) -> MediaResult<()> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        let delay = self.frame_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.render(timestamp as u32).save(output)?;
        Ok(())
    }

    async fn cut(&self, _video: &Path, start: f64, _duration: f64, output: &Path) -> MediaResult<()> {
        self.cuts.fetch_add(1, Ordering::SeqCst);
        if self.failing_cut_starts.contains(&(start as u32)) {
            return Err(MediaError::internal("encoder crashed"));
        }
        tokio::fs::write(output, b"cut").await?;
        Ok(())
    }

    async fn reframe(&self, input: &Path, _target: AspectRatio, output: &Path) -> MediaResult<()> {
        self.reframes.fetch_add(1, Ordering::SeqCst);
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn burn_captions(&self, input: &Path, _srt: &Path, output: &Path) -> MediaResult<()> {
        self.burns.fetch_add(1, Ordering::SeqCst);
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn extract_audio(&self, _input: &Path, output: &Path) -> MediaResult<()> {
        tokio::fs::write(output, b"mp3").await?;
        Ok(())
    }
}

struct Harness {
    orchestrator: JobOrchestrator,
    db: Database,
    store: Arc<MemoryObjectStore>,
    engine: Arc<FakeEngine>,
    video_id: VideoId,
    work_dir: tempfile::TempDir,
}

async fn harness(engine: FakeEngine, balance: u32, transcriber: Option<MockSpeech>) -> Harness {
    let work_dir = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    let engine = Arc::new(engine);

    let video = Video::new_upload(VideoId::new(), OWNER, "ranked.mp4");
    db.videos().insert(&video).await.unwrap();
    db.credits().grant(OWNER, balance).await.unwrap();
    store
        .put_bytes(b"source".to_vec(), &video_source_key(&video.id, "mp4"), "video/mp4")
        .await
        .unwrap();

    let templates = TemplateSet::empty()
        .with_template(KillType::Triple, RgbImage::from_pixel(300, 100, Rgb(TRIPLE)))
        .with_template(KillType::Single, RgbImage::from_pixel(300, 100, Rgb(SINGLE)));
    let config = WorkerConfig {
        work_dir: work_dir.path().to_path_buf(),
        job_budget: Duration::from_secs(300),
        ..WorkerConfig::default()
    };
    let ctx = ProcessingContext::new(
        config,
        db.clone(),
        store.clone(),
        engine.clone(),
        templates,
        transcriber.map(|t| Arc::new(t) as Arc<dyn Transcriber>),
    );

    Harness {
        orchestrator: JobOrchestrator::new(ctx),
        db,
        store,
        engine,
        video_id: video.id,
        work_dir,
    }
}

impl Harness {
    async fn status(&self) -> VideoStatus {
        self.db.videos().get(&self.video_id).await.unwrap().unwrap().status
    }

    async fn balance(&self) -> u32 {
        self.db.credits().balance(OWNER).await.unwrap()
    }

    fn workspace_count(&self) -> usize {
        std::fs::read_dir(self.work_dir.path()).unwrap().count()
    }
}

#[tokio::test]
async fn test_triple_kill_completes_and_charges() {
    let h = harness(FakeEngine::new(70.0, vec![(40, TRIPLE)]), 5, None).await;

    let result = h
        .orchestrator
        .run(&h.video_id, OWNER, JobConfig::default())
        .await
        .unwrap();

    assert_eq!(result.total_detected, 1);
    assert_eq!(result.selected, 1);
    assert_eq!(result.generated, 1);
    assert_eq!(result.credits_charged, 2);
    assert_eq!(result.clips[0].timestamp, 40);
    assert_eq!(result.clips[0].score, 90);
    assert_eq!(result.clips[0].kill_type, KillType::Triple);
    assert!(result.clips[0].filename.starts_with("clip_40s_"));

    assert_eq!(h.status().await, VideoStatus::Completed);
    assert_eq!(h.balance().await, 3);

    let video = h.db.videos().get(&h.video_id).await.unwrap().unwrap();
    assert_eq!(video.credits_charged, 2);
    assert_eq!(video.duration_secs, 70);

    let clips = h.db.clips().list_for_video(&h.video_id).await.unwrap();
    assert_eq!(clips.len(), 1);
    assert!(h.store.contains(&clips[0].storage_key));
    assert!(clips[0].expires_at > clips[0].created_at);

    // 16:9 target needs no reframe; workspace removed
    assert_eq!(h.engine.reframes.load(Ordering::SeqCst), 0);
    assert_eq!(h.workspace_count(), 0);
}

#[tokio::test]
async fn test_insufficient_credits_rolls_back_without_charge() {
    let h = harness(FakeEngine::new(300.0, vec![(40, TRIPLE)]), 2, None).await;

    let err = h
        .orchestrator
        .run(&h.video_id, OWNER, JobConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkerError::InsufficientCredits {
            required: 5,
            balance: 2
        }
    ));
    assert_eq!(h.status().await, VideoStatus::Uploaded);
    assert_eq!(h.balance().await, 2);
    // rejected before detection
    assert_eq!(h.engine.frames.load(Ordering::SeqCst), 0);
    assert_eq!(h.workspace_count(), 0);
}

#[tokio::test]
async fn test_second_submission_conflicts() {
    let h = harness(FakeEngine::new(70.0, vec![(40, TRIPLE)]), 10, None).await;

    let (a, b) = tokio::join!(
        h.orchestrator.run(&h.video_id, OWNER, JobConfig::default()),
        h.orchestrator.run(&h.video_id, OWNER, JobConfig::default()),
    );

    let (ok, conflict) = match (a, b) {
        (Ok(r), Err(e)) | (Err(e), Ok(r)) => (r, e),
        other => panic!("expected one success and one conflict, got {:?}", other),
    };
    assert!(matches!(conflict, WorkerError::Conflict(_)));
    assert!(!conflict.is_retryable());

    let clips = h.db.clips().list_for_video(&h.video_id).await.unwrap();
    assert_eq!(clips.len(), ok.generated);
    assert_eq!(h.balance().await, 8);

    let again = h
        .orchestrator
        .run(&h.video_id, OWNER, JobConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(again, WorkerError::Conflict(_)));
}

#[tokio::test]
async fn test_failed_scene_is_skipped() {
    // kill at t=40 cuts from 30
    let engine = FakeEngine::new(70.0, vec![(20, TRIPLE), (40, TRIPLE), (60, SINGLE)]).failing_cut_at(30);
    let h = harness(engine, 5, None).await;

    let result = h
        .orchestrator
        .run(&h.video_id, OWNER, JobConfig::default())
        .await
        .unwrap();

    assert_eq!(result.selected, 3);
    assert_eq!(result.generated, 2);
    assert!(result.is_partial());
    assert_eq!(result.credits_charged, 2);
    let timestamps: Vec<u32> = result.clips.iter().map(|c| c.timestamp).collect();
    assert_eq!(timestamps, vec![20, 60]);

    assert_eq!(h.status().await, VideoStatus::Completed);
    assert_eq!(h.balance().await, 3);
    assert_eq!(h.engine.cuts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_highlight_filter_drops_low_scores() {
    // single at 60 scores 10 + 20 end bonus = 30
    let h = harness(FakeEngine::new(70.0, vec![(20, TRIPLE), (60, SINGLE)]), 5, None).await;
    let config = JobConfig {
        filter_mode: FilterMode::Highlight,
        ..JobConfig::default()
    };

    let result = h.orchestrator.run(&h.video_id, OWNER, config).await.unwrap();

    assert_eq!(result.total_detected, 2);
    assert_eq!(result.selected, 1);
    assert_eq!(result.clips[0].timestamp, 20);
    let video = h.db.videos().get(&h.video_id).await.unwrap().unwrap();
    assert_eq!(video.config.filter_mode, FilterMode::Highlight);
}

#[tokio::test]
async fn test_caption_failure_keeps_clip() {
    let mut speech = MockSpeech::new();
    speech
        .expect_transcribe()
        .times(2)
        .returning(|_, _| Err(SpeechError::ServiceUnavailable("503".into())));
    let h = harness(FakeEngine::new(70.0, vec![(20, TRIPLE), (40, TRIPLE)]), 5, Some(speech)).await;
    let config = JobConfig {
        caption_enabled: true,
        aspect_ratio: AspectRatio::Portrait,
        ..JobConfig::default()
    };

    let result = h.orchestrator.run(&h.video_id, OWNER, config).await.unwrap();

    assert_eq!(result.selected, 2);
    assert_eq!(result.generated, 2);
    assert_eq!(h.engine.burns.load(Ordering::SeqCst), 0);
    assert_eq!(h.engine.reframes.load(Ordering::SeqCst), 2);
    assert_eq!(h.status().await, VideoStatus::Completed);
}

#[tokio::test]
async fn test_captions_burned_when_transcript_available() {
    let mut speech = MockSpeech::new();
    speech
        .expect_transcribe()
        .withf(|audio, filename| audio.as_slice() == b"mp3" && filename.ends_with(".mp3"))
        .times(1)
        .returning(|_, _| Ok("ナイス！トリプルキル。".to_string()));
    let h = harness(FakeEngine::new(70.0, vec![(40, TRIPLE)]), 5, Some(speech)).await;
    let config = JobConfig {
        caption_enabled: true,
        ..JobConfig::default()
    };

    let result = h.orchestrator.run(&h.video_id, OWNER, config).await.unwrap();

    assert_eq!(result.generated, 1);
    assert_eq!(h.engine.burns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_other_user_is_rejected_without_state_change() {
    let h = harness(FakeEngine::new(70.0, vec![(40, TRIPLE)]), 5, None).await;

    let err = h
        .orchestrator
        .run(&h.video_id, "intruder", JobConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::Unauthorized(_)));
    assert_eq!(h.status().await, VideoStatus::Uploaded);
    assert_eq!(h.balance().await, 5);
}

#[tokio::test]
async fn test_missing_video_is_not_found() {
    let h = harness(FakeEngine::new(70.0, vec![]), 5, None).await;

    let err = h
        .orchestrator
        .run(&VideoId::from("missing"), OWNER, JobConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::NotFound(_)));
}

#[tokio::test]
async fn test_no_kills_still_completes() {
    let h = harness(FakeEngine::new(61.0, vec![]), 5, None).await;

    let result = h
        .orchestrator
        .run(&h.video_id, OWNER, JobConfig::default())
        .await
        .unwrap();

    assert_eq!(result.total_detected, 0);
    assert_eq!(result.generated, 0);
    assert_eq!(result.credits_charged, 2);
    assert_eq!(h.status().await, VideoStatus::Completed);
    assert_eq!(h.balance().await, 3);
}

#[tokio::test]
async fn test_zero_budget_times_out_and_rolls_back() {
    let h = harness(FakeEngine::new(70.0, vec![(40, TRIPLE)]), 5, None).await;
    let ctx = h.orchestrator.context().clone();
    let config = WorkerConfig {
        job_budget: Duration::ZERO,
        ..(*ctx.config).clone()
    };
    let orchestrator = JobOrchestrator::new(ProcessingContext {
        config: Arc::new(config),
        ..ctx
    });

    let err = orchestrator
        .run(&h.video_id, OWNER, JobConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::Timeout { budget_secs: 0 }));
    assert!(err.is_retryable());
    assert_eq!(h.status().await, VideoStatus::Uploaded);
    assert_eq!(h.balance().await, 5);
    assert_eq!(h.workspace_count(), 0);
}

#[tokio::test]
async fn test_dropped_run_rolls_back_and_can_resubmit() {
    let h = harness(FakeEngine::new(70.0, vec![(40, TRIPLE)]), 5, None).await;
    h.engine.set_frame_delay(Duration::from_millis(50));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(150),
        h.orchestrator.run(&h.video_id, OWNER, JobConfig::default()),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(h.engine.frames.load(Ordering::SeqCst) > 0);

    // rollback runs on a detached task
    let mut status = h.status().await;
    for _ in 0..100 {
        if status == VideoStatus::Uploaded {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        status = h.status().await;
    }
    assert_eq!(status, VideoStatus::Uploaded);
    assert_eq!(h.workspace_count(), 0);
    assert_eq!(h.balance().await, 5);

    h.engine.set_frame_delay(Duration::ZERO);
    let result = h
        .orchestrator
        .run(&h.video_id, OWNER, JobConfig::default())
        .await
        .unwrap();
    assert_eq!(result.generated, 1);
    assert_eq!(h.status().await, VideoStatus::Completed);
    assert_eq!(h.balance().await, 3);
}
