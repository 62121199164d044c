use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use log::{debug, info, warn};

use crate::TranscriptResult;
use crate::error::{PipelineError, StrategyFailure};

/// Shortest transcript worth summarizing. Anything below this is treated as a
/// strategy failure, not a result.
pub const MIN_TRANSCRIPT_CHARS: usize = 150;

/// Sentinel substrings that mark a syntactically-successful extraction whose
/// payload is garbage (a strategy stub, an empty shell page). Matched
/// case-insensitively against the whole text.
const PLACEHOLDER_SENTINELS: &[&str] = &[
    "extraction not implemented",
    "not fully implemented",
    "no transcript available",
];

/// One way of getting a transcript out of YouTube. Implementations share
/// nothing beyond this signature: one calls a structured API, one scrapes
/// embedded page data, one drives a headless browser, one shells out to
/// yt-dlp.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, client: &reqwest::Client, video_id: &str) -> Result<TranscriptResult>;

    /// Per-call budget. A timeout is a soft failure like any other.
    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}

/// Tries an ordered list of strategies and returns the first accepted result.
///
/// Strategies run sequentially, most-reliable-first; the first success
/// short-circuits the rest (later strategies are increasingly expensive, so
/// running them concurrently would waste cost for no benefit). A strategy that
/// errors, times out, or returns placeholder/too-short text advances to the
/// next one; only when every strategy is exhausted does acquisition fail, and
/// then with the full list of per-strategy reasons.
pub struct TranscriptAcquirer {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl TranscriptAcquirer {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn acquire(
        &self,
        client: &reqwest::Client,
        video_id: &str,
    ) -> Result<TranscriptResult, PipelineError> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            debug!("Trying {} extraction for {video_id}", strategy.name());

            let outcome = tokio::time::timeout(strategy.timeout(), strategy.fetch(client, video_id)).await;

            let result = match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    warn!("{} extraction failed for {video_id}: {e}", strategy.name());
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason: format!("{e}"),
                    });
                    continue;
                }
                Err(_) => {
                    warn!(
                        "{} extraction timed out for {video_id} after {:?}",
                        strategy.name(),
                        strategy.timeout()
                    );
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason: format!("timed out after {:?}", strategy.timeout()),
                    });
                    continue;
                }
            };

            if let Some(reason) = reject_placeholder(&result.text) {
                warn!("{} returned a rejected result for {video_id}: {reason}", strategy.name());
                failures.push(StrategyFailure {
                    strategy: strategy.name(),
                    reason,
                });
                continue;
            }

            info!(
                "Extracted transcript for {video_id} via {} ({} chars)",
                strategy.name(),
                result.text.len()
            );
            return Ok(result);
        }

        Err(PipelineError::AcquisitionExhausted {
            video_id: video_id.to_string(),
            failures,
        })
    }
}

/// Returns the rejection reason when text is placeholder or too short to be a
/// real transcript, None when it is acceptable.
fn reject_placeholder(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.len() < MIN_TRANSCRIPT_CHARS {
        return Some(format!(
            "transcript too short ({} chars, minimum {MIN_TRANSCRIPT_CHARS})",
            trimmed.len()
        ));
    }
    let lowered = trimmed.to_lowercase();
    for sentinel in PLACEHOLDER_SENTINELS {
        if lowered.contains(sentinel) {
            return Some(format!("placeholder text detected (\"{sentinel}\")"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionMethod;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum MockOutcome {
        Ok(String),
        Err(String),
    }

    struct MockStrategy {
        name: &'static str,
        outcome: MockOutcome,
        calls: Arc<AtomicUsize>,
    }

    impl MockStrategy {
        fn ok(name: &'static str, text: &str) -> Self {
            Self {
                name,
                outcome: MockOutcome::Ok(text.to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn err(name: &'static str, reason: &str) -> Self {
            Self {
                name,
                outcome: MockOutcome::Err(reason.to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ExtractionStrategy for MockStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _client: &reqwest::Client, video_id: &str) -> Result<TranscriptResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                MockOutcome::Ok(text) => Ok(TranscriptResult {
                    text: text.clone(),
                    title: format!("Video {video_id}"),
                    method: ExtractionMethod::Api,
                    language: "en".to_string(),
                }),
                MockOutcome::Err(reason) => eyre::bail!("{reason}"),
            }
        }
    }

    fn real_text() -> String {
        "A real transcript sentence about the subject matter under discussion. ".repeat(10)
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let first = MockStrategy::ok("api", &real_text());
        let second = MockStrategy::ok("scraping", &real_text());
        let second_calls = second.calls.clone();
        let acquirer = TranscriptAcquirer::new(vec![Box::new(first), Box::new(second)]);
        let client = reqwest::Client::new();

        let result = acquirer.acquire(&client, "abc123def45").await.unwrap();
        assert_eq!(result.text, real_text());
        // The losing strategy must never have run
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_past_failures_and_placeholders() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(MockStrategy::err("api", "network down")),
            Box::new(MockStrategy::ok("scraping", "not fully implemented")),
            Box::new(MockStrategy::ok("browser", &real_text())),
        ];
        let acquirer = TranscriptAcquirer::new(strategies);
        let client = reqwest::Client::new();

        let result = acquirer.acquire(&client, "abc123def45").await.unwrap();
        assert_eq!(result.text, real_text());
    }

    #[tokio::test]
    async fn test_placeholder_from_last_strategy_exhausts() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> =
            vec![Box::new(MockStrategy::ok("scraping", "not fully implemented"))];
        let acquirer = TranscriptAcquirer::new(strategies);
        let client = reqwest::Client::new();

        let err = acquirer.acquire(&client, "abc123def45").await.unwrap_err();
        match err {
            PipelineError::AcquisitionExhausted { video_id, failures } => {
                assert_eq!(video_id, "abc123def45");
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].strategy, "scraping");
                assert!(failures[0].reason.contains("placeholder") || failures[0].reason.contains("short"));
            }
            other => panic!("expected AcquisitionExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_collects_every_reason_in_order() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(MockStrategy::err("api", "no captions available")),
            Box::new(MockStrategy::err("scraping", "blocked")),
            Box::new(MockStrategy::err("browser", "chromium not found")),
        ];
        let acquirer = TranscriptAcquirer::new(strategies);
        let client = reqwest::Client::new();

        let err = acquirer.acquire(&client, "abc123def45").await.unwrap_err();
        match err {
            PipelineError::AcquisitionExhausted { failures, .. } => {
                let names: Vec<_> = failures.iter().map(|f| f.strategy).collect();
                assert_eq!(names, vec!["api", "scraping", "browser"]);
                assert!(failures[0].reason.contains("no captions available"));
            }
            other => panic!("expected AcquisitionExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_short_text_is_rejected() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(MockStrategy::ok("api", "way too short")),
            Box::new(MockStrategy::ok("ytdlp", &real_text())),
        ];
        let acquirer = TranscriptAcquirer::new(strategies);
        let client = reqwest::Client::new();

        let result = acquirer.acquire(&client, "abc123def45").await.unwrap();
        assert_eq!(result.text, real_text());
    }

    #[test]
    fn test_reject_placeholder_accepts_real_text() {
        assert!(reject_placeholder(&real_text()).is_none());
    }

    #[test]
    fn test_reject_placeholder_is_case_insensitive() {
        let padded = format!("{} Extraction NOT Implemented {}", "x".repeat(100), "y".repeat(100));
        assert!(reject_placeholder(&padded).is_some());
    }
}
