//! Object key layout.
//!
//! ```text
//! videos/{video_id}.{ext}
//! clips/{video_id}/{uuid}-{filename}
//! ```

use clipforge_models::VideoId;
use uuid::Uuid;

const MAX_FILENAME_LEN: usize = 128;

/// Key of an uploaded source video.
pub fn video_source_key(video_id: &VideoId, extension: &str) -> String {
    let ext = sanitize_component(extension);
    let ext = if ext.is_empty() { "mp4".to_string() } else { ext };
    format!("videos/{}.{}", video_id, ext)
}

/// Collision-resistant key for a generated clip.
pub fn clip_key(video_id: &VideoId, filename: &str) -> String {
    clip_key_with_nonce(video_id, Uuid::new_v4(), filename)
}

pub fn clip_key_with_nonce(video_id: &VideoId, nonce: Uuid, filename: &str) -> String {
    let name = sanitize_filename(filename);
    format!("clips/{}/{}-{}", video_id, nonce, name)
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Leading dots are stripped so a key segment is never `.` or `..`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let mut cleaned: String = cleaned.chars().take(MAX_FILENAME_LEN).collect();
    if cleaned.is_empty() {
        cleaned.push_str("clip.mp4");
    }
    cleaned
}

fn sanitize_component(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_lowercase()
}
