use thiserror::Error;

/// One strategy's failure reason, kept for diagnostics when acquisition exhausts.
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Errors that propagate to the caller of the pipeline.
///
/// Everything else is recovered locally: strategy failures advance to the next
/// strategy, and validation failures are absorbed by the extractive fallback.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not extract a video ID from: {0}")]
    InvalidUrl(String),

    #[error("unknown summary mode: {0} (expected \"quick\" or \"indepth\")")]
    InvalidMode(String),

    #[error("every transcript extraction strategy failed for video {video_id}")]
    AcquisitionExhausted {
        video_id: String,
        failures: Vec<StrategyFailure>,
    },

    #[error("summarization service unavailable: {0}")]
    SummarizationUnavailable(String),
}

impl PipelineError {
    /// A specific, user-facing message per error kind.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidUrl(input) => format!(
                "'{input}' doesn't look like a YouTube URL or video ID.\n\nSupported formats:\n  \
                 https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  \
                 https://www.youtube.com/embed/ID\n  https://www.youtube.com/shorts/ID\n  \
                 <11-character video ID>"
            ),
            PipelineError::InvalidMode(mode) => {
                format!("unknown mode '{mode}': use \"quick\" or \"indepth\"")
            }
            PipelineError::AcquisitionExhausted { video_id, failures } => {
                let mut msg = format!(
                    "no retrievable captions or transcript for video {video_id}. \
                     Every extraction method failed:\n"
                );
                for failure in failures {
                    msg.push_str(&format!("  {failure}\n"));
                }
                msg
            }
            PipelineError::SummarizationUnavailable(reason) => format!(
                "the summarization service is temporarily unavailable ({reason}). \
                 Please try again in a moment."
            ),
        }
    }
}
