use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;

/// The generation model as the pipeline sees it: one opaque call. Prompt
/// construction and response parsing live on our side of this seam.
#[async_trait]
pub trait GenerationModel: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Pick the provider from the model name: "claude*" is Anthropic, everything
/// else goes through the OpenAI-compatible endpoint.
pub fn model_for(client: reqwest::Client, model: &str) -> Box<dyn GenerationModel> {
    if model.starts_with("claude") {
        Box::new(AnthropicModel {
            client,
            model: model.to_string(),
        })
    } else {
        Box::new(OpenAiModel {
            client,
            model: model.to_string(),
        })
    }
}

const SYSTEM_PROMPT: &str = "You are a helpful assistant that analyzes video transcripts and returns structured JSON summaries. \
Always return valid JSON with no additional text before or after the JSON object. \
Ensure all JSON is properly formatted and escaped.";

pub struct AnthropicModel {
    client: reqwest::Client,
    model: String,
}

#[async_trait]
impl GenerationModel for AnthropicModel {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            eyre::eyre!("ANTHROPIC_API_KEY environment variable not set (required for Claude summarization)")
        })?;

        debug!("Generating via Anthropic API with model {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "system": SYSTEM_PROMPT,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Anthropic API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_anthropic_text(&json)
    }
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    if let Some(content) = json.get("content").and_then(|c| c.as_array()) {
        let text: String = content
            .iter()
            .filter_map(|block| {
                if block.get("type")?.as_str()? == "text" {
                    block.get("text")?.as_str().map(|s| s.to_string())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected Anthropic API response format");
}

pub struct OpenAiModel {
    client: reqwest::Client,
    model: String,
}

#[async_trait]
impl GenerationModel for OpenAiModel {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            eyre::eyre!("OPENAI_API_KEY environment variable not set (required for OpenAI summarization)")
        })?;

        debug!("Generating via OpenAI API with model {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "max_completion_tokens": max_tokens,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("OpenAI API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_openai_text(&json)
    }
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
    {
        return Ok(text.to_string());
    }
    bail!("unexpected OpenAI API response format");
}
