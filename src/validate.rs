use log::{info, warn};

use crate::SummaryMode;
use crate::summary::{Argument, AttributedQuote, Paragraph, StructuredSummary, Topic, TopicAnalysis};

/// Phrases that mark a model refusal dressed up as output. Checked as
/// lowercase substrings against the summary's text fields. Closed list:
/// refusals observed in practice, not a heuristic.
const REFUSAL_PHRASES: &[&str] = &[
    "i cannot summarize",
    "i can't summarize",
    "i am unable to summarize",
    "i'm unable to summarize",
    "cannot provide a summary",
    "i'm sorry, but i can",
];

/// Schema cap on `quick_takeaway`, char-wise since titles can be multibyte.
const MAX_TAKEAWAY_CHARS: usize = 150;

/// How much of the transcript the extractive fallback lifts.
const FALLBACK_KEY_POINTS: usize = 5;
const FALLBACK_PARAGRAPHS: usize = 5;
const FALLBACK_SENTENCES_PER_PARAGRAPH: usize = 3;

/// Turn raw model output into a schema-valid summary, or build the extractive
/// fallback. Never fails: the caller always gets a usable summary, and
/// validation problems are logged as quality degradation rather than raised.
pub fn validate_or_fallback(
    raw_output: &str,
    mode: SummaryMode,
    transcript: &str,
    title: &str,
) -> StructuredSummary {
    match try_parse(raw_output, mode) {
        Ok(summary) => summary,
        Err(reason) => {
            warn!("Model output rejected ({reason}), using extractive fallback for '{title}'");
            extractive_fallback(transcript, title, mode)
        }
    }
}

fn try_parse(raw_output: &str, mode: SummaryMode) -> Result<StructuredSummary, String> {
    let json = strip_code_fence(raw_output);

    let mut summary: StructuredSummary =
        serde_json::from_str(json).map_err(|e| format!("not valid summary JSON: {e}"))?;

    check_required_fields(&summary, mode)?;
    check_refusal_phrases(&summary)?;
    normalize_for_mode(&mut summary, mode);

    info!("Parsed {mode} summary with {} paragraphs", summary.full_summary.len());
    Ok(summary)
}

/// Model output can overshoot the schema for the requested mode. A quick
/// summary must not carry the indepth-only sections, and the takeaway is
/// capped at 150 characters in every mode.
fn normalize_for_mode(summary: &mut StructuredSummary, mode: SummaryMode) {
    if mode == SummaryMode::Quick {
        summary.detailed_analysis = None;
        summary.key_quotes = None;
        summary.arguments = None;
    }
    if summary.quick_takeaway.chars().count() > MAX_TAKEAWAY_CHARS {
        warn!("quick_takeaway exceeds {MAX_TAKEAWAY_CHARS} chars, truncating");
        summary.quick_takeaway = summary.quick_takeaway.chars().take(MAX_TAKEAWAY_CHARS).collect();
    }
}

/// Models occasionally wrap the JSON object in a Markdown code fence despite
/// instructions. Tolerate that one deviation; anything else must parse as-is.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn check_required_fields(summary: &StructuredSummary, mode: SummaryMode) -> Result<(), String> {
    if summary.quick_takeaway.trim().is_empty() {
        return Err("missing quick_takeaway".to_string());
    }
    if summary.key_points.is_empty() {
        return Err("key_points is empty".to_string());
    }
    if summary.full_summary.is_empty() {
        return Err("full_summary is empty".to_string());
    }

    if mode == SummaryMode::Indepth {
        match &summary.detailed_analysis {
            Some(list) if !list.is_empty() => {}
            _ => return Err("missing detailed_analysis".to_string()),
        }
        match &summary.key_quotes {
            Some(list) if !list.is_empty() => {}
            _ => return Err("missing key_quotes".to_string()),
        }
        match &summary.arguments {
            Some(list) if !list.is_empty() => {}
            _ => return Err("missing arguments".to_string()),
        }
    }

    Ok(())
}

fn check_refusal_phrases(summary: &StructuredSummary) -> Result<(), String> {
    let mut fields: Vec<&str> = vec![&summary.quick_takeaway];
    fields.extend(summary.key_points.iter().map(|s| s.as_str()));
    fields.extend(summary.full_summary.iter().map(|p| p.content.as_str()));

    for field in fields {
        let lowered = field.to_lowercase();
        for phrase in REFUSAL_PHRASES {
            if lowered.contains(phrase) {
                return Err(format!("refusal phrase detected (\"{phrase}\")"));
            }
        }
    }
    Ok(())
}

/// Deterministic summary built from the transcript itself, no model involved.
/// Leading sentences become key points and paragraphs; the takeaway comes
/// from the title. Always schema-valid for the requested mode and tagged
/// `fallback_source` so consumers can tell it apart from generated output.
pub fn extractive_fallback(transcript: &str, title: &str, mode: SummaryMode) -> StructuredSummary {
    let sentences = split_sentences(transcript);

    let key_points: Vec<String> = sentences.iter().take(FALLBACK_KEY_POINTS).cloned().collect();
    let key_points = if key_points.is_empty() {
        vec![format!("Transcript of \"{title}\" is available but could not be summarized.")]
    } else {
        key_points
    };

    let mut full_summary: Vec<Paragraph> = sentences
        .chunks(FALLBACK_SENTENCES_PER_PARAGRAPH)
        .take(FALLBACK_PARAGRAPHS)
        .enumerate()
        .map(|(i, chunk)| Paragraph {
            id: i as u32 + 1,
            content: chunk.join(" "),
        })
        .collect();
    if full_summary.is_empty() {
        full_summary.push(Paragraph {
            id: 1,
            content: transcript.trim().to_string(),
        });
    }

    let quick_takeaway: String = format!("Summary of: {title}").chars().take(MAX_TAKEAWAY_CHARS).collect();

    let first_sentence = sentences.first().cloned().unwrap_or_else(|| title.to_string());

    let (detailed_analysis, key_quotes, arguments) = match mode {
        SummaryMode::Quick => (None, None, None),
        SummaryMode::Indepth => (
            Some(vec![TopicAnalysis {
                topic: title.to_string(),
                analysis: full_summary[0].content.clone(),
            }]),
            Some(vec![AttributedQuote {
                quote: first_sentence.clone(),
                context: "Opening of the transcript".to_string(),
                speaker: "speaker".to_string(),
            }]),
            Some(vec![Argument {
                claim: first_sentence,
                evidence: String::new(),
                counterpoint: String::new(),
            }]),
        ),
    };

    StructuredSummary {
        quick_takeaway,
        key_points,
        topics: vec![Topic {
            name: "Video Content".to_string(),
            body: full_summary[0].content.clone(),
            section_ref: 1,
        }],
        timestamps: vec![],
        full_summary,
        detailed_analysis,
        key_quotes,
        arguments,
        fallback_source: true,
    }
}

/// Split on sentence-ending punctuation followed by whitespace. Good enough
/// for transcript prose; not a linguistic segmenter.
pub fn split_sentences(text: &str) -> Vec<String> {
    regex::Regex::new(r"(?s)(.*?[.!?])(?:\s+|$)")
        .unwrap()
        .captures_iter(text.trim())
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
