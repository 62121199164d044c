use std::time::Duration;

use log::{debug, info, warn};

use crate::SummaryMode;
use crate::error::PipelineError;
use crate::model::GenerationModel;
use crate::summary::StructuredSummary;
use crate::validate::{split_sentences, validate_or_fallback};

/// Average speaking rate used to estimate video length from transcript size.
const WORDS_PER_MINUTE: f64 = 150.0;

/// Input guard: transcripts past this are truncated at a word boundary before
/// prompting. Conservative for every model we dispatch to.
const MAX_INPUT_WORDS: usize = 100_000;

/// Budget for one intermediate chunk summary.
const CHUNK_SUMMARY_MAX_TOKENS: u32 = 1000;

/// Per-attempt budget for a generation call.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(180);

/// The generation call gets one bounded retry; the extraction chain already
/// provides resilience upstream, so acquisition strategies get none.
const GENERATION_ATTEMPTS: u32 = 2;

/// Estimate source video length in minutes from transcript word count.
/// Pure; returns 0.0 for empty input.
pub fn estimate_minutes(transcript: &str) -> f64 {
    let words = transcript.split_whitespace().count();
    words as f64 / WORDS_PER_MINUTE
}

/// Per-mode knobs, selected once at call time.
///
/// Indepth mode's richer schema needs smaller, more granular inputs to retain
/// quote- and argument-level fidelity, so it chunks earlier and finer; quick
/// mode tolerates coarser compression.
#[derive(Debug, Clone, Copy)]
pub struct ModeConfig {
    pub chunk_threshold_minutes: f64,
    pub chunk_size_words: usize,
    pub max_output_tokens: u32,
}

impl ModeConfig {
    pub fn for_mode(mode: SummaryMode) -> Self {
        match mode {
            SummaryMode::Quick => Self {
                chunk_threshold_minutes: 60.0,
                chunk_size_words: 3000,
                max_output_tokens: 2500,
            },
            SummaryMode::Indepth => Self {
                chunk_threshold_minutes: 30.0,
                chunk_size_words: 1500,
                max_output_tokens: 8000,
            },
        }
    }
}

const QUICK_PROMPT: &str = r#"You are a world-class summarization engine. Summarize the video transcript below.

Principles: be direct and concise; preserve context and attribution when the speaker quotes or cites someone; capture the speaker's actual message and tone without softening it; cover every major topic.

Return ONLY a valid JSON object with exactly this structure:
{
  "quick_takeaway": "One sentence, max 150 characters, capturing the core message.",
  "key_points": ["5 to 7 concise insights, each a complete thought in 1-2 sentences."],
  "topics": [{"name": "Major theme", "body": "One-line gloss of the theme", "section_ref": 1}],
  "timestamps": [{"time": "MM:SS or HH:MM:SS", "description": "Key moment, max 100 chars"}],
  "full_summary": [{"id": 1, "content": "5 to 8 well-developed narrative paragraphs in total."}]
}

Each topic's section_ref points at the full_summary paragraph id where it begins.

# TRANSCRIPT
---
{transcript}
---

Video Title: {title}

Return ONLY the JSON object, no text before or after it."#;

const INDEPTH_PROMPT: &str = r#"You are a world-class summarization engine. Produce a comprehensive, in-depth analysis of the video transcript below.

Principles: be direct and concise; preserve context and attribution when the speaker quotes or cites someone; capture the speaker's actual message and tone without softening it; cover every major topic, argument, and quote.

Return ONLY a valid JSON object with exactly this structure:
{
  "quick_takeaway": "One sentence, max 150 characters, capturing the core message.",
  "key_points": ["10 to 15 detailed insights, each a complete thought in 1-2 sentences."],
  "topics": [{"name": "Major theme", "body": "One-line gloss of the theme", "section_ref": 1}],
  "timestamps": [{"time": "MM:SS or HH:MM:SS", "description": "Key moment, max 100 chars"}],
  "full_summary": [{"id": 1, "content": "8 to 12 comprehensive narrative paragraphs in total."}],
  "detailed_analysis": [{"topic": "Topic name", "analysis": "Deep dive with nuance, context, and implications."}],
  "key_quotes": [{"quote": "Exact verbatim quote", "context": "When/why it was said", "speaker": "Who said it"}],
  "arguments": [{"claim": "Main claim made", "evidence": "Supporting reasoning given", "counterpoint": "Limitations mentioned, if any"}]
}

Each topic's section_ref points at the full_summary paragraph id where it begins.

# TRANSCRIPT
---
{transcript}
---

Video Title: {title}

Return ONLY the JSON object, no text before or after it."#;

/// Condensed prompt for intermediate chunk summaries. Chunk summaries feed
/// the reduce step, they are never user-facing, so no schema here.
const CHUNK_PROMPT: &str = r#"Summarize the following transcript segment. Be concise and capture the main points, preserving any attribution.

Transcript:
---
{chunk}
---

Title: {title}

Provide a 2-3 paragraph plain-text summary of this segment."#;

/// Mode-aware, length-adaptive summarization: short transcripts go through a
/// single prompt, long ones are map-reduced through chunk summaries first.
pub struct SummarizationEngine {
    model: Box<dyn GenerationModel>,
}

impl SummarizationEngine {
    pub fn new(model: Box<dyn GenerationModel>) -> Self {
        Self { model }
    }

    pub async fn summarize(
        &self,
        transcript: &str,
        title: &str,
        mode: SummaryMode,
    ) -> Result<StructuredSummary, PipelineError> {
        let config = ModeConfig::for_mode(mode);
        let estimated = estimate_minutes(transcript);

        if estimated > config.chunk_threshold_minutes {
            info!(
                "Estimated {estimated:.1} min (> {} min threshold), using chunked summarization for {mode} mode",
                config.chunk_threshold_minutes
            );
            self.summarize_chunked(transcript, title, mode, config).await
        } else {
            info!("Estimated {estimated:.1} min, using single-pass summarization for {mode} mode");
            self.summarize_single_pass(transcript, title, mode, config).await
        }
    }

    async fn summarize_single_pass(
        &self,
        transcript: &str,
        title: &str,
        mode: SummaryMode,
        config: ModeConfig,
    ) -> Result<StructuredSummary, PipelineError> {
        let bounded = truncate_words(transcript, MAX_INPUT_WORDS);
        let template = match mode {
            SummaryMode::Quick => QUICK_PROMPT,
            SummaryMode::Indepth => INDEPTH_PROMPT,
        };
        let prompt = template.replace("{transcript}", &bounded).replace("{title}", title);

        let raw = self.generate_with_retry(&prompt, config.max_output_tokens).await?;

        // Parse and validation failures never escape: the validator either
        // accepts the model output or builds the extractive fallback.
        Ok(validate_or_fallback(&raw, mode, transcript, title))
    }

    async fn summarize_chunked(
        &self,
        transcript: &str,
        title: &str,
        mode: SummaryMode,
        config: ModeConfig,
    ) -> Result<StructuredSummary, PipelineError> {
        let chunks = split_into_chunks(transcript, config.chunk_size_words);
        info!(
            "Split transcript into {} chunks of ~{} words for {mode} mode",
            chunks.len(),
            config.chunk_size_words
        );

        let mut chunk_summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_title = format!("{title} (Part {}/{})", i + 1, chunks.len());
            debug!("Summarizing chunk {}/{}", i + 1, chunks.len());

            let prompt = CHUNK_PROMPT.replace("{chunk}", chunk).replace("{title}", &chunk_title);
            match self.generate_with_retry(&prompt, CHUNK_SUMMARY_MAX_TOKENS).await {
                Ok(summary) => chunk_summaries.push(summary),
                Err(e) => {
                    // A lost chunk degrades quality, it doesn't sink the run
                    warn!("Chunk {}/{} summarization failed ({e}), using excerpt", i + 1, chunks.len());
                    chunk_summaries.push(excerpt(chunk, 500));
                }
            }
        }

        let meta_transcript = chunk_summaries.join("\n\n---\n\n");
        info!(
            "Built meta-transcript from {} chunk summaries ({} chars)",
            chunk_summaries.len(),
            meta_transcript.len()
        );

        self.summarize_single_pass(&meta_transcript, title, mode, config).await
    }

    async fn generate_with_retry(&self, prompt: &str, max_tokens: u32) -> Result<String, PipelineError> {
        let mut last_err = String::new();
        for attempt in 0..GENERATION_ATTEMPTS {
            match tokio::time::timeout(GENERATION_TIMEOUT, self.model.generate(prompt, max_tokens)).await {
                Ok(Ok(raw)) => return Ok(raw),
                Ok(Err(e)) => {
                    warn!("Generation attempt {} failed: {e}", attempt + 1);
                    last_err = format!("{e}");
                }
                Err(_) => {
                    warn!("Generation attempt {} timed out after {GENERATION_TIMEOUT:?}", attempt + 1);
                    last_err = format!("timed out after {GENERATION_TIMEOUT:?}");
                }
            }
            if attempt + 1 < GENERATION_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
        Err(PipelineError::SummarizationUnavailable(last_err))
    }
}

/// Split into ordered segments of about `chunk_size` words, never splitting
/// mid-sentence when the text has sentence punctuation to work with.
pub fn split_into_chunks(transcript: &str, chunk_size: usize) -> Vec<String> {
    let sentences = split_sentences(transcript);
    if sentences.is_empty() {
        // No sentence structure at all; fall back to a plain word split
        let words: Vec<&str> = transcript.split_whitespace().collect();
        return words.chunks(chunk_size).map(|c| c.join(" ")).collect();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_words = 0usize;

    for sentence in sentences {
        let sentence_words = sentence.split_whitespace().count();
        if current_words + sentence_words > chunk_size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_words = 0;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
        current_words += sentence_words;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    warn!("Transcript exceeds {max_words} words, truncating");
    let mut bounded = words[..max_words].join(" ");
    bounded.push_str("... [TRUNCATED DUE TO LENGTH]");
    bounded
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
