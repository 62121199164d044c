pub mod browser;
pub mod captions;
pub mod scrape;
pub mod ytdlp;

use eyre::{Result, bail};

use crate::acquire::ExtractionStrategy;

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// The production strategy chain, most-reliable-first. Later entries cost more
/// per attempt (a browser launch, a yt-dlp download) so order matters.
pub fn default_strategies(lang: &str) -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(captions::CaptionsApiStrategy::new(lang)),
        Box::new(scrape::PageScrapeStrategy::new(lang)),
        Box::new(browser::HeadlessBrowserStrategy::new()),
        Box::new(ytdlp::YtdlpStrategy::new(lang)),
    ]
}

/// Strip caption artifacts ([Music], (inaudible)) and collapse whitespace.
pub(crate) fn clean_transcript_text(text: &str) -> String {
    let no_brackets = regex::Regex::new(r"\[[^\]]*\]").unwrap().replace_all(text, "");
    let no_parens = regex::Regex::new(r"\([^)]*\)").unwrap().replace_all(&no_brackets, "");
    regex::Regex::new(r"\s+")
        .unwrap()
        .replace_all(&no_parens, " ")
        .trim()
        .to_string()
}

/// Parse YouTube's timed-text caption XML into a single joined transcript.
/// Shared by the captions-API and page-scrape strategies, which reach the same
/// XML endpoint through different routes.
pub(crate) fn parse_timedtext_xml(xml: &str) -> Result<String> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut parts: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                in_text = true;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                in_text = false;
            }
            Ok(Event::Text(ref e)) if in_text => {
                let raw = e.unescape().unwrap_or_default().to_string();
                let text = html_escape::decode_html_entities(&raw).trim().to_string();
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(clean_transcript_text(&parts.join(" ")))
}
