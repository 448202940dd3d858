//! Preflight for a worker host: work dir, FFmpeg tools, templates and env.
//!
//! Diagnostics go to stderr through `tracing`; stdout carries only the verdict.

use std::path::Path;

use anyhow::Context;
use clipforge_media::{check_ffmpeg, check_ffprobe, TemplateSet};
use clipforge_worker::WorkerConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const REQUIRED_ENV: [&str; 4] = [
    "R2_ENDPOINT_URL",
    "R2_ACCESS_KEY_ID",
    "R2_SECRET_ACCESS_KEY",
    "R2_BUCKET_NAME",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    match run().await {
        Ok(()) => {
            println!("worker-selfcheck: ok");
            Ok(())
        }
        Err(e) => {
            error!("Self-check failed: {:#}", e);
            println!("worker-selfcheck: failed");
            Err(e)
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env();
    info!(work_dir = %config.work_dir.display(), "Starting worker self-check");
    ensure_workdir(&config.work_dir).await?;

    let ffmpeg = check_ffmpeg().context("ffmpeg unavailable")?;
    let ffprobe = check_ffprobe().context("ffprobe unavailable")?;
    info!(ffmpeg = %ffmpeg.display(), ffprobe = %ffprobe.display(), "FFmpeg tools found");

    report_templates(&config.template_dir);

    let missing = missing_env(&REQUIRED_ENV);
    if !missing.is_empty() {
        anyhow::bail!("missing required env vars: {}", missing.join(", "));
    }
    if std::env::var("GROQ_API_KEY").is_err() {
        warn!("GROQ_API_KEY unset, captions disabled");
    }
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("clipforge=info".parse()?);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
    Ok(())
}

async fn ensure_workdir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("cannot create work dir {}", path.display()))?;
    let marker = path.join(".clipforge-selfcheck");
    tokio::fs::write(&marker, b"ok")
        .await
        .with_context(|| format!("work dir {} not writable", path.display()))?;
    tokio::fs::remove_file(&marker).await?;
    Ok(())
}

fn report_templates(dir: &Path) {
    let templates = TemplateSet::load_dir(dir);
    if templates.is_empty() {
        warn!(dir = %dir.display(), "No templates loaded, detection will find nothing");
    } else {
        info!(available = ?templates.available(), "Templates loaded");
    }
}

fn missing_env<'a>(vars: &[&'a str]) -> Vec<&'a str> {
    vars.iter()
        .copied()
        .filter(|var| std::env::var(var).map_or(true, |v| v.trim().is_empty()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_lists_only_absent_vars() {
        let absent = "CLIPFORGE_SELFCHECK_SURELY_UNSET_VAR";
        assert_eq!(missing_env(&["PATH", absent]), vec![absent]);
        assert!(missing_env(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_ensure_workdir_creates_nested_dir() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_workdir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 0);
    }
}
