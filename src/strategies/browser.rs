use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use regex::Regex;

use super::clean_transcript_text;
use crate::acquire::ExtractionStrategy;
use crate::{ExtractionMethod, TranscriptResult};

/// Chromium binaries to try, in order.
const BROWSER_BINARIES: &[&str] = &["chromium", "chromium-browser", "google-chrome"];

/// Last-resort strategy: render the watch page in a headless browser and mine
/// the dumped DOM for transcript text.
///
/// Slow and heavy, but the rendered page sometimes carries caption data that
/// neither the API nor the raw page HTML exposes. The browser process is the
/// strategy's own resource: it runs to completion (or is killed on timeout)
/// within a single call, nothing leaks across requests.
pub struct HeadlessBrowserStrategy;

impl HeadlessBrowserStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeadlessBrowserStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionStrategy for HeadlessBrowserStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(90)
    }

    async fn fetch(&self, _client: &reqwest::Client, video_id: &str) -> Result<TranscriptResult> {
        let url = format!("https://www.youtube.com/watch?v={video_id}");
        let dom = dump_dom(&url).await?;

        let title = extract_page_title(&dom).unwrap_or_else(|| format!("Video {video_id}"));
        let text = extract_transcript_from_dom(&dom)?;

        Ok(TranscriptResult {
            text,
            title,
            method: ExtractionMethod::Browser,
            language: "unknown".to_string(),
        })
    }
}

async fn dump_dom(url: &str) -> Result<String> {
    for binary in BROWSER_BINARIES {
        debug!("Dumping DOM via {binary}: {url}");
        let output = tokio::process::Command::new(binary)
            .args([
                "--headless=new",
                "--disable-gpu",
                "--no-sandbox",
                "--virtual-time-budget=10000",
                "--dump-dom",
                url,
            ])
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                return Ok(String::from_utf8_lossy(&out.stdout).to_string());
            }
            Ok(out) => {
                bail!("{binary} exited with status {}", out.status);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => bail!("failed to run {binary}: {e}"),
        }
    }
    bail!(
        "no headless browser found (tried {})",
        BROWSER_BINARIES.join(", ")
    );
}

fn extract_page_title(dom: &str) -> Option<String> {
    let re = Regex::new(r"<title>([^<]+)</title>").ok()?;
    let raw = re.captures(dom)?.get(1)?.as_str();
    let title = html_escape::decode_html_entities(raw).replace(" - YouTube", "").trim().to_string();
    if title.is_empty() { None } else { Some(title) }
}

/// Mine the rendered page for caption segment text. The player response in
/// the rendered DOM carries segments as "text":"..." fields under the
/// transcript renderer.
fn extract_transcript_from_dom(dom: &str) -> Result<String> {
    if !dom.contains("transcriptSegmentListRenderer") && !dom.contains("captionTracks") {
        bail!("no transcript data in rendered page");
    }

    let re = Regex::new(r#""text"\s*:\s*"((?:[^"\\]|\\.)*)""#)?;
    let parts: Vec<String> = re
        .captures_iter(dom)
        .map(|caps| caps[1].replace("\\n", " ").replace("\\\"", "\""))
        .filter(|s| !s.trim().is_empty())
        .collect();

    if parts.is_empty() {
        bail!("transcript renderer present but no segment text found");
    }

    Ok(clean_transcript_text(&parts.join(" ")))
}
