use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use regex::Regex;

use super::clean_transcript_text;
use crate::acquire::ExtractionStrategy;
use crate::{ExtractionMethod, TranscriptResult};

/// Final fallback: yt-dlp, a maintained third-party extractor.
///
/// Asks yt-dlp to write auto-generated subtitles as WebVTT to a temp path,
/// parses the VTT into plain text, and cleans up afterwards. Needs the yt-dlp
/// binary on PATH; its absence is a soft failure like any other.
pub struct YtdlpStrategy {
    lang: String,
}

impl YtdlpStrategy {
    pub fn new(lang: &str) -> Self {
        Self { lang: lang.to_string() }
    }

    // Pid in the name so concurrent runs of the same video never race on
    // the same subtitle file.
    fn output_template(&self, video_id: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ytsum-{}-{video_id}", std::process::id()))
    }

    fn subtitle_path(&self, video_id: &str) -> PathBuf {
        let mut path = self.output_template(video_id).into_os_string();
        path.push(format!(".{}.vtt", self.lang));
        PathBuf::from(path)
    }
}

#[async_trait]
impl ExtractionStrategy for YtdlpStrategy {
    fn name(&self) -> &'static str {
        "ytdlp"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(120)
    }

    async fn fetch(&self, _client: &reqwest::Client, video_id: &str) -> Result<TranscriptResult> {
        let url = format!("https://www.youtube.com/watch?v={video_id}");
        let output_template = self.output_template(video_id).display().to_string();
        let subtitle_path = self.subtitle_path(video_id);

        debug!("Fetching auto-subs via yt-dlp: {url}");

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--skip-download",
                "--write-auto-subs",
                "--sub-langs",
                &self.lang,
                "--sub-format",
                "vtt",
                "--no-playlist",
                "--quiet",
                "--no-warnings",
                "-o",
                &output_template,
                &url,
            ])
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {}
            Ok(out) => bail!(
                "yt-dlp exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!("yt-dlp not found. Install it:\n  pip install yt-dlp\n  or: brew install yt-dlp");
            }
            Err(e) => bail!("failed to run yt-dlp: {e}"),
        }

        if !subtitle_path.exists() {
            bail!("yt-dlp did not produce a subtitle file (video may have no auto-subs)");
        }

        let vtt = tokio::fs::read_to_string(&subtitle_path).await?;
        let _ = tokio::fs::remove_file(&subtitle_path).await;

        let text = parse_vtt(&vtt);
        if text.is_empty() {
            bail!("subtitle file contained no usable text");
        }

        let title = get_video_title(video_id).await.unwrap_or_else(|| format!("Video {video_id}"));

        Ok(TranscriptResult {
            text,
            title,
            method: ExtractionMethod::Ytdlp,
            language: self.lang.clone(),
        })
    }
}

async fn get_video_title(video_id: &str) -> Option<String> {
    let url = format!("https://www.youtube.com/watch?v={video_id}");
    let out = tokio::process::Command::new("yt-dlp")
        .args(["--get-title", "--no-playlist", &url])
        .output()
        .await
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let title = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if title.is_empty() { None } else { Some(title) }
}

/// Flatten a WebVTT file into plain transcript text.
///
/// Skips headers, cue timings and metadata, strips inline timestamp/class
/// tags, and drops the rolled-up duplicate lines auto-subs are full of.
fn parse_vtt(vtt: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").unwrap();

    let mut parts: Vec<String> = Vec::new();
    for line in vtt.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.contains("-->")
            || line.chars().all(|c| c.is_ascii_digit())
            || line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.starts_with("NOTE")
        {
            continue;
        }
        let clean = tag_re.replace_all(line, "").trim().to_string();
        if clean.is_empty() {
            continue;
        }
        // Auto-subs repeat each line as the cue rolls up
        if parts.last().map(|last| last == &clean).unwrap_or(false) {
            continue;
        }
        parts.push(clean);
    }

    clean_transcript_text(&parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VTT: &str = "WEBVTT\n\
Kind: captions\n\
Language: en\n\
\n\
00:00:00.000 --> 00:00:02.500\n\
welcome<00:00:01.200><c> back</c> everyone\n\
\n\
00:00:02.500 --> 00:00:05.000\n\
welcome back everyone\n\
today we talk about caching\n\
\n\
00:00:05.000 --> 00:00:08.000\n\
today we talk about caching\n\
and cache invalidation\n";

    #[test]
    fn test_parse_vtt_strips_headers_and_timings() {
        let text = parse_vtt(VTT);
        assert!(!text.contains("WEBVTT"));
        assert!(!text.contains("-->"));
        assert!(text.contains("welcome back everyone"));
        assert!(text.contains("cache invalidation"));
    }

    #[test]
    fn test_parse_vtt_deduplicates_rollup_lines() {
        let text = parse_vtt(VTT);
        assert_eq!(text.matches("today we talk about caching").count(), 1);
    }

    #[test]
    fn test_parse_vtt_strips_inline_tags() {
        let text = parse_vtt(VTT);
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_parse_vtt_empty() {
        assert_eq!(parse_vtt("WEBVTT\n\n"), "");
    }

    #[test]
    fn test_subtitle_path_is_process_scoped() {
        let strategy = YtdlpStrategy::new("en");
        let path = strategy.subtitle_path("abc123def45");
        assert!(path.starts_with(std::env::temp_dir()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("ytsum-{}-abc123def45.en.vtt", std::process::id()));
    }
}
