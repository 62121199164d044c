use crate::SummaryMode;

/// Bump whenever a prompt template or the summary schema changes. Old cached
/// summaries then miss naturally and age out via TTL instead of requiring a
/// manual cache flush.
pub const PROMPT_VERSION: &str = "v1";

/// Cache key for a video's transcript.
pub fn transcript_key(video_id: &str) -> String {
    format!("transcript:{video_id}")
}

/// Cache key for a final summary. Namespaced by mode and prompt version so the
/// same video can hold one entry per mode, and prompt changes never collide
/// with entries written under the previous version.
///
/// Keyed by video id rather than transcript content: the key must be
/// computable before any transcript exists, so a summary cache hit can skip
/// acquisition entirely.
pub fn summary_key(video_id: &str, mode: SummaryMode) -> String {
    format!("summary:{video_id}:{mode}:{PROMPT_VERSION}")
}
