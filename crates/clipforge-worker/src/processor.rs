//! Job orchestration.
//!
//! One run drives a single video through download, probe, credit pre-flight,
//! frame sampling, kill detection, scene filtering and clip assembly, then
//! settles everything in one database transaction. Any failure after the
//! `uploaded -> processing` transition rolls the video back to `uploaded`
//! without charging, and so does dropping the run future before it settles.

use std::path::PathBuf;
use std::sync::Arc;

use clipforge_db::{Database, JobCompletion};
use clipforge_media::{Checkpoint, FfmpegEngine, FrameSampler, KillDetector, MediaEngine, TemplateSet};
use clipforge_models::{Clip, JobConfig, JobResult, Video, VideoId};
use clipforge_speech::{Transcriber, WhisperClient};
use clipforge_storage::{video_source_key, ObjectStore, R2Client};
use scopeguard::ScopeGuard;
use tracing::{info, warn, Instrument};

use crate::budget::JobBudget;
use crate::clip_pipeline::{AssemblyOptions, AssemblyReport, AssemblyRequest, ClipAssembler};
use crate::config::WorkerConfig;
use crate::credits::{required_units, CreditLedger};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::scene_filter::filter_scenes;
use crate::workspace::JobWorkspace;

/// Shared clients, constructed once at startup.
#[derive(Clone)]
pub struct ProcessingContext {
    pub config: Arc<WorkerConfig>,
    pub db: Database,
    pub storage: Arc<dyn ObjectStore>,
    pub engine: Arc<dyn MediaEngine>,
    pub detector: Arc<KillDetector>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
}

impl ProcessingContext {
    pub fn new(
        config: WorkerConfig,
        db: Database,
        storage: Arc<dyn ObjectStore>,
        engine: Arc<dyn MediaEngine>,
        templates: TemplateSet,
        transcriber: Option<Arc<dyn Transcriber>>,
    ) -> Self {
        let detector = KillDetector::new(templates)
            .with_thresholds(config.thresholds)
            .with_weights(config.scoring)
            .with_checkpoint_every(config.checkpoint_frames);
        Self {
            config: Arc::new(config),
            db,
            storage,
            engine,
            detector: Arc::new(detector),
            transcriber,
        }
    }

    /// Production wiring: R2 storage, FFmpeg, templates from disk and the
    /// Whisper client when an API key is configured.
    pub async fn from_env(config: WorkerConfig, db: Database) -> WorkerResult<Self> {
        let storage: Arc<dyn ObjectStore> = Arc::new(R2Client::from_env()?);
        let engine: Arc<dyn MediaEngine> =
            Arc::new(FfmpegEngine::new().with_timeout(config.ffmpeg_timeout));
        let templates = TemplateSet::load_dir(&config.template_dir);
        let transcriber = WhisperClient::from_env()?.map(|c| Arc::new(c) as Arc<dyn Transcriber>);
        if transcriber.is_none() {
            info!("Speech-to-text not configured, captions disabled");
        }
        Ok(Self::new(config, db, storage, engine, templates, transcriber))
    }
}

/// Runs processing jobs against a [`ProcessingContext`].
#[derive(Clone)]
pub struct JobOrchestrator {
    ctx: ProcessingContext,
    assembler: Arc<ClipAssembler>,
    ledger: CreditLedger,
}

impl JobOrchestrator {
    pub fn new(ctx: ProcessingContext) -> Self {
        let assembler = ClipAssembler::new(
            Arc::clone(&ctx.engine),
            Arc::clone(&ctx.storage),
            ctx.transcriber.clone(),
            AssemblyOptions::from_config(&ctx.config),
        );
        let ledger = CreditLedger::new(ctx.db.credits());
        Self {
            ctx,
            assembler: Arc::new(assembler),
            ledger,
        }
    }

    pub fn context(&self) -> &ProcessingContext {
        &self.ctx
    }

    /// Process `video_id` on behalf of `requester_id`.
    ///
    /// Ownership and status are checked before any state change. Once the
    /// video is `processing`, every error path rolls it back to `uploaded`,
    /// and so does dropping the returned future before it resolves.
    pub async fn run(
        &self,
        video_id: &VideoId,
        requester_id: &str,
        config: JobConfig,
    ) -> WorkerResult<JobResult> {
        let logger = JobLogger::new(video_id, requester_id);
        let span = logger.span();

        async {
            let video = self.claim(video_id, requester_id, &config).await.inspect_err(|e| {
                record_outcome(e.kind());
            })?;
            let db = self.ctx.db.clone();
            let guarded_id = video_id.clone();
            let mut unsettled = scopeguard::guard(None::<PathBuf>, move |workspace| {
                rollback_detached(db, guarded_id, workspace)
            });
            logger.started(&config);

            let budget = JobBudget::start(self.ctx.config.job_budget);
            let workspace = match JobWorkspace::create(&self.ctx.config.work_dir, video_id).await {
                Ok(ws) => ws,
                Err(e) => {
                    let e = WorkerError::from(e);
                    self.fail(&logger, video_id, &e).await;
                    ScopeGuard::into_inner(unsettled);
                    return Err(e);
                }
            };
            *unsettled = Some(workspace.path().to_path_buf());

            let outcome = self.execute(&video, &config, &budget, &workspace, &logger).await;
            workspace.cleanup().await;

            match outcome {
                Ok(result) => {
                    ScopeGuard::into_inner(unsettled);
                    record_outcome("completed");
                    metrics::counter!("clipforge_credits_debited_total")
                        .increment(result.credits_charged as u64);
                    metrics::histogram!("clipforge_job_duration_seconds")
                        .record(budget.elapsed().as_secs_f64());
                    logger.completed(&result, budget.elapsed());
                    Ok(result)
                }
                Err(e) => {
                    self.fail(&logger, video_id, &e).await;
                    ScopeGuard::into_inner(unsettled);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Ownership and status checks, then the guarded `uploaded -> processing` transition.
    async fn claim(
        &self,
        video_id: &VideoId,
        requester_id: &str,
        config: &JobConfig,
    ) -> WorkerResult<Video> {
        let videos = self.ctx.db.videos();
        let video = videos
            .get(video_id)
            .await?
            .ok_or_else(|| WorkerError::not_found(format!("video {}", video_id)))?;

        if !video.is_owned_by(requester_id) {
            return Err(WorkerError::unauthorized("video belongs to another user"));
        }
        if !video.status.accepts_submission() {
            return Err(WorkerError::conflict(format!("video is already {}", video.status)));
        }
        if !videos.try_begin_processing(video_id, config).await? {
            return Err(WorkerError::conflict("video is already being processed"));
        }
        Ok(video)
    }

    async fn execute(
        &self,
        video: &Video,
        config: &JobConfig,
        budget: &JobBudget,
        workspace: &JobWorkspace,
        logger: &JobLogger,
    ) -> WorkerResult<JobResult> {
        let cfg = &self.ctx.config;
        budget.checkpoint("workspace")?;

        let extension = video.source_extension();
        let source = workspace.source_path(&video.id, &extension);
        self.ctx
            .storage
            .get_to_file(&video_source_key(&video.id, &extension), &source)
            .await?;
        budget.checkpoint("download")?;

        let info = self.ctx.engine.probe(&source).await?;
        info.check_processable(cfg.max_duration_secs)?;
        budget.checkpoint("validation")?;
        logger.stage(
            "validation",
            budget.elapsed(),
            &format!("probed {:.1}s {}x{}", info.duration, info.width, info.height),
        );

        let credits = required_units(info.duration);
        self.ledger.ensure_affordable(&video.user_id, credits).await?;
        budget.checkpoint("detection_start")?;

        let mut sampler = FrameSampler::new(
            Arc::clone(&self.ctx.engine),
            &source,
            workspace.frames_dir(),
            info.duration,
            cfg.sample_interval_secs,
        )
        .await?;
        let detected = self.ctx.detector.detect(&mut sampler, Some(budget as &dyn Checkpoint)).await?;
        let selected = filter_scenes(&detected, config.filter_mode, &cfg.filter);
        logger.stage(
            "detection",
            budget.elapsed(),
            &format!("detected={} selected={}", detected.len(), selected.len()),
        );
        budget.checkpoint("clip_generation")?;

        let request = AssemblyRequest {
            video_id: &video.id,
            source: &source,
            source_duration: info.duration,
            config,
            workspace,
        };
        let report = self.assembler.assemble(&request, &selected).await;
        if report.generated() < report.selected {
            logger.warning(&format!(
                "{} of {} clips failed",
                report.selected - report.generated(),
                report.selected
            ));
        }

        self.settle(video, info.duration, credits, &report).await?;

        Ok(JobResult {
            video_id: video.id.clone(),
            total_detected: detected.len(),
            selected: report.selected,
            generated: report.generated(),
            credits_charged: credits,
            clips: report.clips.iter().map(Clip::summary).collect(),
        })
    }

    /// Persist clips, debit and complete atomically; discard uploads if that fails.
    async fn settle(
        &self,
        video: &Video,
        duration: f64,
        credits: u32,
        report: &AssemblyReport,
    ) -> WorkerResult<()> {
        let completion = JobCompletion {
            video_id: &video.id,
            user_id: &video.user_id,
            clips: &report.clips,
            duration_secs: duration.floor() as u32,
            credits,
        };
        if let Err(e) = self.ctx.db.videos().complete_with_clips(completion).await {
            self.assembler.discard(&report.clips).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn fail(&self, logger: &JobLogger, video_id: &VideoId, error: &WorkerError) {
        record_outcome(error.kind());
        logger.failed(error);
        let rollback = self.ctx.db.videos().rollback_to_uploaded(video_id).await;
        logger.rollback(&rollback);
    }
}

/// Drop path of a claim that was never settled: the run future went away
/// between the claim and settlement. Workspace removal and the rollback run
/// on a detached task.
fn rollback_detached(db: Database, video_id: VideoId, workspace: Option<PathBuf>) {
    record_outcome("cancelled");

    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!(video_id = %video_id, "Job dropped outside a runtime, left for the stale sweep");
        return;
    };
    warn!(video_id = %video_id, "Job dropped before settling, rolling back");

    runtime.spawn(async move {
        if let Some(path) = workspace {
            if let Err(e) = tokio::fs::remove_dir_all(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove job workspace");
                }
            }
        }
        if let Err(e) = db.videos().rollback_to_uploaded(&video_id).await {
            warn!(video_id = %video_id, error = %e, "Rollback of dropped job failed");
        }
    });
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("clipforge_jobs_total", "outcome" => outcome).increment(1);
}
