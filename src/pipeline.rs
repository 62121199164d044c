use std::time::Duration;

use log::info;

use crate::acquire::TranscriptAcquirer;
use crate::cache::{CacheStore, SUMMARY_TTL, TRANSCRIPT_TTL};
use crate::error::PipelineError;
use crate::fingerprint::{summary_key, transcript_key};
use crate::summarize::SummarizationEngine;
use crate::summary::StructuredSummary;
use crate::{SummaryMode, TranscriptResult, VideoIdentity};

/// Result of one pipeline run, with enough context to render it.
#[derive(Debug)]
pub struct PipelineReport {
    pub video: VideoIdentity,
    pub mode: SummaryMode,
    pub summary: StructuredSummary,
}

/// Owns the full flow for one video: resolve, check caches, acquire
/// transcript, summarize, validate, cache. Stages stay ignorant of each
/// other; this is the only place that knows the order.
pub struct PipelineOrchestrator {
    cache: CacheStore,
    acquirer: TranscriptAcquirer,
    engine: SummarizationEngine,
    client: reqwest::Client,
    transcript_ttl: Duration,
    summary_ttl: Duration,
}

impl PipelineOrchestrator {
    pub fn new(
        cache: CacheStore,
        acquirer: TranscriptAcquirer,
        engine: SummarizationEngine,
        client: reqwest::Client,
    ) -> Self {
        Self {
            cache,
            acquirer,
            engine,
            client,
            transcript_ttl: TRANSCRIPT_TTL,
            summary_ttl: SUMMARY_TTL,
        }
    }

    /// Override the default TTLs (config file knob).
    pub fn with_ttls(mut self, transcript_ttl: Duration, summary_ttl: Duration) -> Self {
        self.transcript_ttl = transcript_ttl;
        self.summary_ttl = summary_ttl;
        self
    }

    pub async fn process(&self, input: &str, mode: SummaryMode) -> Result<PipelineReport, PipelineError> {
        let video = VideoIdentity::parse(input).ok_or_else(|| PipelineError::InvalidUrl(input.to_string()))?;

        // A cached summary short-circuits everything, including acquisition
        let skey = summary_key(&video.video_id, mode);
        if let Some(summary) = self.cache.get::<StructuredSummary>(&skey) {
            info!("Summary cache hit for {} ({mode})", video.video_id);
            return Ok(PipelineReport { video, mode, summary });
        }

        let tkey = transcript_key(&video.video_id);
        let transcript = match self.cache.get::<TranscriptResult>(&tkey) {
            Some(cached) => {
                info!("Transcript cache hit for {}", video.video_id);
                cached
            }
            None => {
                let fresh = self.acquirer.acquire(&self.client, &video.video_id).await?;
                self.cache.set(&tkey, &fresh, self.transcript_ttl);
                fresh
            }
        };

        let summary = self.engine.summarize(&transcript.text, &transcript.title, mode).await?;
        self.cache.set(&skey, &summary, self.summary_ttl);

        Ok(PipelineReport { video, mode, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionMethod;
    use crate::acquire::ExtractionStrategy;
    use crate::model::GenerationModel;
    use async_trait::async_trait;
    use eyre::Result;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockStrategy {
        name: &'static str,
        outcome: Result<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl MockStrategy {
        fn ok(name: &'static str, text: &str) -> Self {
            Self {
                name,
                outcome: Ok(text.to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn err(name: &'static str, reason: &str) -> Self {
            Self {
                name,
                outcome: Err(reason.to_string()),
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
                Ok(text) => Ok(TranscriptResult {
                    text: text.clone(),
                    title: format!("Video {video_id}"),
                    method: ExtractionMethod::Api,
                    language: "en".to_string(),
                }),
                Err(reason) => eyre::bail!("{reason}"),
            }
        }
    }

    struct MockModel {
        response: String,
        calls: Arc<AtomicUsize>,
    }

    impl MockModel {
        fn returning(response: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    response: response.to_string(),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl GenerationModel for MockModel {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    /// Valid for both modes: quick ignores the extra fields, indepth needs them.
    fn model_json() -> String {
        serde_json::json!({
            "quick_takeaway": "The core message.",
            "key_points": ["One.", "Two.", "Three.", "Four.", "Five."],
            "topics": [{"name": "Theme", "body": "Gloss", "section_ref": 1}],
            "timestamps": [{"time": "01:00", "description": "Moment"}],
            "full_summary": [{"id": 1, "content": "Paragraph one."}],
            "detailed_analysis": [{"topic": "Theme", "analysis": "Deep dive."}],
            "key_quotes": [{"quote": "Quote.", "context": "Intro", "speaker": "host"}],
            "arguments": [{"claim": "Claim.", "evidence": "Evidence.", "counterpoint": ""}]
        })
        .to_string()
    }

    /// About 1950 words in full sentences, well over the acceptance minimum
    /// and well under any chunking threshold.
    fn real_transcript() -> String {
        "The speaker explains one more detail about the main argument. ".repeat(195)
    }

    fn orchestrator(
        cache: CacheStore,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
        model: MockModel,
    ) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            cache,
            TranscriptAcquirer::new(strategies),
            SummarizationEngine::new(Box::new(model)),
            reqwest::Client::new(),
        )
    }

    const URL: &str = "https://www.youtube.com/watch?v=abc123def45";

    #[tokio::test]
    async fn test_invalid_url_is_rejected_up_front() {
        let (model, _) = MockModel::returning(&model_json());
        let orch = orchestrator(CacheStore::disabled(), vec![], model);
        let err = orch.process("not a url", SummaryMode::Quick).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_repeat_request_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockStrategy::ok("api", &real_transcript());
        let strategy_calls = strategy.calls.clone();
        let (model, model_calls) = MockModel::returning(&model_json());
        let orch = orchestrator(CacheStore::new(dir.path().to_path_buf()), vec![Box::new(strategy)], model);

        let first = orch.process(URL, SummaryMode::Quick).await.unwrap();
        assert_eq!(strategy_calls.load(Ordering::SeqCst), 1);
        assert_eq!(model_calls.load(Ordering::SeqCst), 1);

        let second = orch.process(URL, SummaryMode::Quick).await.unwrap();
        // No strategy and no model invocation the second time
        assert_eq!(strategy_calls.load(Ordering::SeqCst), 1);
        assert_eq!(model_calls.load(Ordering::SeqCst), 1);

        let a = serde_json::to_string(&first.summary).unwrap();
        let b = serde_json::to_string(&second.summary).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_summary_cache_hit_skips_acquisition_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(dir.path().to_path_buf());
        let summary: StructuredSummary = serde_json::from_str(&model_json()).unwrap();
        cache.set(
            &summary_key("abc123def45", SummaryMode::Quick),
            &summary,
            SUMMARY_TTL,
        );

        // Acquisition would fail if it ran
        let strategy = MockStrategy::err("api", "network down");
        let strategy_calls = strategy.calls.clone();
        let (model, _) = MockModel::returning(&model_json());
        let orch = orchestrator(cache, vec![Box::new(strategy)], model);

        let report = orch.process(URL, SummaryMode::Quick).await.unwrap();
        assert_eq!(strategy_calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.summary.quick_takeaway, "The core message.");
    }

    #[tokio::test]
    async fn test_modes_cache_independently() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockStrategy::ok("api", &real_transcript());
        let (model, model_calls) = MockModel::returning(&model_json());
        let orch = orchestrator(CacheStore::new(dir.path().to_path_buf()), vec![Box::new(strategy)], model);

        let quick = orch.process(URL, SummaryMode::Quick).await.unwrap();
        let indepth = orch.process(URL, SummaryMode::Indepth).await.unwrap();

        // Same video, different modes: two generations, two summary entries
        assert_eq!(model_calls.load(Ordering::SeqCst), 2);
        assert!(indepth.summary.detailed_analysis.is_some());
        assert!(indepth.summary.key_quotes.is_some());
        assert!(indepth.summary.arguments.is_some());
        // The quick result stays quick-shaped even though the model offered more
        assert!(quick.summary.detailed_analysis.is_none());
        assert!(quick.summary.key_quotes.is_none());
        assert!(quick.summary.arguments.is_none());
        assert_eq!(quick.mode, SummaryMode::Quick);

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        // one transcript entry plus one summary per mode
        assert_eq!(entries, 3);
    }

    #[tokio::test]
    async fn test_exhausted_acquisition_surfaces_all_reasons() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(MockStrategy::err("api", "no captions")),
            Box::new(MockStrategy::err("scraping", "blocked")),
        ];
        let (model, model_calls) = MockModel::returning(&model_json());
        let orch = orchestrator(CacheStore::disabled(), strategies, model);

        let err = orch.process(URL, SummaryMode::Quick).await.unwrap_err();
        match err {
            PipelineError::AcquisitionExhausted { failures, .. } => assert_eq!(failures.len(), 2),
            other => panic!("expected AcquisitionExhausted, got {other:?}"),
        }
        assert_eq!(model_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_chain_end_to_end() {
        // First strategy errors, second returns a placeholder stub, third
        // delivers a real ~13-minute transcript.
        let winner = MockStrategy::ok("browser", &real_transcript());
        let winner_calls = winner.calls.clone();
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(MockStrategy::err("api", "503 from player endpoint")),
            Box::new(MockStrategy::ok("scraping", "not fully implemented")),
            Box::new(winner),
        ];
        let (model, model_calls) = MockModel::returning(&model_json());
        let orch = orchestrator(CacheStore::disabled(), strategies, model);

        let report = orch.process(URL, SummaryMode::Quick).await.unwrap();

        assert_eq!(winner_calls.load(Ordering::SeqCst), 1);
        // ~13 estimated minutes is under the quick threshold: single pass
        assert_eq!(model_calls.load(Ordering::SeqCst), 1);
        assert!(!report.summary.fallback_source);
        assert!((5..=7).contains(&report.summary.key_points.len()));
    }

    #[tokio::test]
    async fn test_transcript_cache_reused_across_modes() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockStrategy::ok("api", &real_transcript());
        let strategy_calls = strategy.calls.clone();
        let (model, _) = MockModel::returning(&model_json());
        let orch = orchestrator(CacheStore::new(dir.path().to_path_buf()), vec![Box::new(strategy)], model);

        orch.process(URL, SummaryMode::Quick).await.unwrap();
        orch.process(URL, SummaryMode::Indepth).await.unwrap();

        // The indepth run found the transcript already cached
        assert_eq!(strategy_calls.load(Ordering::SeqCst), 1);
    }
}
