pub mod acquire;
pub mod cache;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod strategies;
pub mod summarize;
pub mod summary;
pub mod validate;

use serde::{Deserialize, Serialize};

/// A video resolved from user input. Derived once, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoIdentity {
    pub video_id: String,
    pub canonical_url: String,
}

impl VideoIdentity {
    /// Resolve a YouTube URL (or bare 11-character video ID) into a VideoIdentity.
    ///
    /// Supported formats:
    ///   https://www.youtube.com/watch?v=ID
    ///   https://youtu.be/ID
    ///   https://www.youtube.com/embed/ID
    ///   https://www.youtube.com/shorts/ID
    ///   https://m.youtube.com/watch?v=ID
    ///   <11-character video ID>
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        if regex::Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap().is_match(input) {
            return Some(Self::from_id(input));
        }

        let patterns = [
            r"(?:youtube\.com/watch\?.*v=)([a-zA-Z0-9_-]{11})",
            r"youtu\.be/([a-zA-Z0-9_-]{11})",
            r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
            r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
        ];

        for pattern in patterns {
            if let Some(caps) = regex::Regex::new(pattern).unwrap().captures(input) {
                return Some(Self::from_id(&caps[1]));
            }
        }

        None
    }

    fn from_id(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            canonical_url: format!("https://www.youtube.com/watch?v={video_id}"),
        }
    }
}

/// How a transcript was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Api,
    Scraping,
    Browser,
    Ytdlp,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMethod::Api => write!(f, "api"),
            ExtractionMethod::Scraping => write!(f, "scraping"),
            ExtractionMethod::Browser => write!(f, "browser"),
            ExtractionMethod::Ytdlp => write!(f, "ytdlp"),
        }
    }
}

/// Complete transcript for a video, produced by exactly one extraction strategy.
/// Never partially filled: a strategy either returns every field or fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub text: String,
    pub title: String,
    pub method: ExtractionMethod,
    pub language: String,
}

/// Summarization mode. Explicit per request, never inferred from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Quick,
    Indepth,
}

impl std::fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryMode::Quick => write!(f, "quick"),
            SummaryMode::Indepth => write!(f, "indepth"),
        }
    }
}

impl std::str::FromStr for SummaryMode {
    type Err = crate::error::PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quick" => Ok(SummaryMode::Quick),
            "indepth" => Ok(SummaryMode::Indepth),
            other => Err(crate::error::PipelineError::InvalidMode(other.to_string())),
        }
    }
}
