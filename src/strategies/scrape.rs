use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use regex::Regex;
use scraper::{Html, Selector};

use super::{USER_AGENT, parse_timedtext_xml};
use crate::acquire::ExtractionStrategy;
use crate::{ExtractionMethod, TranscriptResult};

/// Fallback strategy: scrape the caption track URL out of the player-response
/// JSON blob that YouTube embeds in the watch page.
///
/// Works on some videos where the InnerTube player endpoint refuses the
/// anonymous WEB client, since the embedded blob is rendered for the page
/// itself. One page fetch, one caption fetch, no API key dance.
pub struct PageScrapeStrategy {
    lang: String,
}

impl PageScrapeStrategy {
    pub fn new(lang: &str) -> Self {
        Self { lang: lang.to_string() }
    }
}

#[async_trait]
impl ExtractionStrategy for PageScrapeStrategy {
    fn name(&self) -> &'static str {
        "scraping"
    }

    async fn fetch(&self, client: &reqwest::Client, video_id: &str) -> Result<TranscriptResult> {
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Scraping watch page: {watch_url}");

        let page_html = client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let title = extract_og_title(&page_html).unwrap_or_else(|| format!("Video {video_id}"));

        let (caption_url, language) = extract_caption_track(&page_html, &self.lang)
            .ok_or_else(|| eyre::eyre!("no caption track found in embedded player data"))?;

        debug!("Found embedded caption track: lang={language}");

        let caption_xml = client
            .get(&caption_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = parse_timedtext_xml(&caption_xml)?;
        if text.is_empty() {
            bail!("embedded caption track was empty for video {video_id}");
        }

        Ok(TranscriptResult {
            text,
            title,
            method: ExtractionMethod::Scraping,
            language,
        })
    }
}

fn extract_og_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
    let title = document.select(&selector).next()?.value().attr("content")?.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.replace(" - YouTube", ""))
    }
}

/// Pull (base_url, language_code) pairs out of the captionTracks array inside
/// ytInitialPlayerResponse. Prefers the requested language, else the first
/// listed track.
fn extract_caption_track(html: &str, lang: &str) -> Option<(String, String)> {
    let tracks_re = Regex::new(r#""captionTracks"\s*:\s*\[(.*?)\]"#).ok()?;
    let tracks_blob = tracks_re.captures(html)?.get(1)?.as_str();

    let track_re =
        Regex::new(r#""baseUrl"\s*:\s*"([^"]+)"[^}]*?"languageCode"\s*:\s*"([^"]+)""#).ok()?;

    let mut first: Option<(String, String)> = None;
    for caps in track_re.captures_iter(tracks_blob) {
        let url = unescape_json_url(&caps[1]);
        let code = caps[2].to_string();
        if code == lang {
            return Some((url, code));
        }
        if first.is_none() {
            first = Some((url, code));
        }
    }
    first
}

/// The embedded JSON escapes '&' as backslash-u0026 and '/' as backslash-slash.
fn unescape_json_url(url: &str) -> String {
    url.replace("\\u0026", "&").replace("\\/", "/")
}
