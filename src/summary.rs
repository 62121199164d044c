use serde::{Deserialize, Serialize};

/// A major theme of the video, pointing at the `full_summary` paragraph where
/// it is covered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub section_ref: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedMoment {
    /// "MM:SS" or "HH:MM:SS"
    pub time: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: u32,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAnalysis {
    pub topic: String,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedQuote {
    pub quote: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub speaker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub claim: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub counterpoint: String,
}

/// The final structured summary.
///
/// `detailed_analysis`, `key_quotes` and `arguments` are present only in
/// indepth mode. `fallback_source` marks summaries built by the local
/// extractive fallback instead of the generation model, so consumers and logs
/// can tell the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSummary {
    pub quick_takeaway: String,
    pub key_points: Vec<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub timestamps: Vec<TimestampedMoment>,
    pub full_summary: Vec<Paragraph>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<Vec<TopicAnalysis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_quotes: Option<Vec<AttributedQuote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Argument>>,

    #[serde(default)]
    pub fallback_source: bool,
}
