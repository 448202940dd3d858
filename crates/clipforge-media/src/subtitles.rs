//! SRT caption synthesis from a plain transcript.

use std::fmt::Write;

/// Characters that end a caption line. The terminator stays on its line.
const SENTENCE_TERMINATORS: [char; 6] = ['。', '！', '？', '.', '!', '?'];

/// One timed caption.
#[derive(Debug, Clone, PartialEq)]
pub struct SrtCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Split a transcript into caption lines: after each sentence terminator
/// and at newlines, trimmed, blanks dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        let line = current.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
        current.clear();
    };

    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            flush(&mut current);
            continue;
        }
        current.push(ch);
        if SENTENCE_TERMINATORS.contains(&ch) {
            flush(&mut current);
        }
    }
    flush(&mut current);

    lines
}

/// Distribute `duration` seconds evenly across the transcript's lines.
///
/// A transcript without usable lines yields no cues.
pub fn build_cues(text: &str, duration: f64) -> Vec<SrtCue> {
    let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    let lines = split_sentences(text);
    if lines.is_empty() {
        return Vec::new();
    }

    let per_line = duration / lines.len() as f64;
    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| SrtCue {
            start: i as f64 * per_line,
            end: (i + 1) as f64 * per_line,
            text,
        })
        .collect()
}

/// `HH:MM:SS,mmm`
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

pub fn render_srt(cues: &[SrtCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text
        );
    }
    out
}

/// Render a transcript straight to SRT. Returns `None` for a blank transcript.
pub fn transcript_to_srt(text: &str, duration: f64) -> Option<String> {
    let cues = build_cues(text, duration);
    if cues.is_empty() {
        None
    } else {
        Some(render_srt(&cues))
    }
}
