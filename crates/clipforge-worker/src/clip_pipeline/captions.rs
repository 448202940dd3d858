//! Speech-to-text captions burned into a clip.

use std::path::{Path, PathBuf};

use clipforge_media::subtitles::transcript_to_srt;
use tracing::{debug, info};

use super::ClipAssembler;
use crate::error::WorkerResult;

/// Transcribe `clip` and burn the result into a new file under `scratch`.
///
/// Returns `Ok(None)` when captioning is unavailable or the clip has no
/// speech; errors are for the caller to downgrade.
pub(super) async fn caption_clip(
    assembler: &ClipAssembler,
    clip: &Path,
    scratch: &Path,
    duration: f64,
) -> WorkerResult<Option<PathBuf>> {
    let Some(transcriber) = assembler.transcriber.as_ref() else {
        info!("No transcriber configured, skipping captions");
        return Ok(None);
    };

    let audio = scratch.join("audio.mp3");
    assembler.engine.extract_audio(clip, &audio).await?;
    let bytes = tokio::fs::read(&audio).await?;

    let transcript = transcriber.transcribe(bytes, "audio.mp3").await?;
    debug!(chars = transcript.chars().count(), "Transcript received");

    let Some(srt) = transcript_to_srt(&transcript, duration) else {
        info!("Transcript empty, skipping captions");
        return Ok(None);
    };

    let srt_path = scratch.join("captions.srt");
    tokio::fs::write(&srt_path, srt).await?;

    let captioned = scratch.join("captioned.mp4");
    assembler
        .engine
        .burn_captions(clip, &srt_path, &captioned)
        .await?;
    Ok(Some(captioned))
}
