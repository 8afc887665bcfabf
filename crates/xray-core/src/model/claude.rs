//! Claude Vision API client.
//!
//! Attaches the request's images, appends the expected answer schema to the
//! prompt, and parses the JSON object out of the text response.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::media::{detect_media_type, MediaSource};
use super::{ModelCapability, ModelRequest};
use crate::config::ModelConfig;
use crate::error::{XrayError, XrayResult};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for calling Claude API with vision capabilities.
pub struct ClaudeVisionClient {
    api_key: String,
    model: String,
    api_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "image")]
    Image { source: ImageSource },
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl ClaudeVisionClient {
    /// Create a client from configuration. Fails when no API key is set.
    pub fn from_config(config: &ModelConfig) -> XrayResult<Self> {
        let api_key = config.require_api_key()?.to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| XrayError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            api_url: config.api_url.clone(),
            max_tokens: config.max_tokens,
            client,
        })
    }

    /// Turn a media reference into a base64 image block, downloading remote images.
    async fn image_block(&self, reference: &str) -> Result<ContentBlock> {
        let (media_type, data) = match MediaSource::parse(reference) {
            Some(MediaSource::Inline { media_type, data }) => (media_type, data),
            Some(MediaSource::Remote { url }) => self.download(&url).await?,
            None => anyhow::bail!("Unsupported media reference (expected data: or http(s) URL)"),
        };

        Ok(ContentBlock::Image {
            source: ImageSource {
                source_type: "base64".to_string(),
                media_type,
                data,
            },
        })
    }

    async fn download(&self, url: &str) -> Result<(String, String)> {
        debug!(url, "Downloading image");
        let response = self.client.get(url)
            .send()
            .await
            .context("Failed to download image")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Failed to download image: HTTP {}", status);
        }

        let media_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(';').next().unwrap_or(s).trim().to_string())
            .unwrap_or_else(|| detect_media_type(url));

        let bytes = response.bytes().await
            .context("Failed to read image bytes")?;

        debug!(size = bytes.len(), media_type = %media_type, "Image downloaded");
        Ok((media_type, base64::engine::general_purpose::STANDARD.encode(&bytes)))
    }

    async fn call(&self, request: &ModelRequest) -> Result<Value> {
        let mut content = Vec::with_capacity(request.media.len() + 1);
        for reference in &request.media {
            content.push(self.image_block(reference).await?);
        }
        content.push(ContentBlock::Text {
            text: with_output_instructions(&request.prompt, &request.output_schema)?,
        });

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content,
            }],
        };

        debug!(model = %self.model, prompt = %request.prompt_name, "Calling Claude Vision API");
        let api_response = self.client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to call Claude API")?;

        let api_status = api_response.status();
        if !api_status.is_success() {
            let error_text = api_response.text().await.unwrap_or_default();
            anyhow::bail!("Claude API error (HTTP {}): {}", api_status, error_text);
        }

        let response_body: MessagesResponse = api_response.json().await
            .context("Failed to parse Claude API response")?;

        let text = response_body.content
            .iter()
            .find(|c| c.content_type == "text")
            .and_then(|c| c.text.as_ref())
            .ok_or_else(|| anyhow::anyhow!("No text content in Claude API response"))?;

        serde_json::from_str(&extract_json(text))
            .context("Failed to parse JSON from Claude response")
    }
}

#[async_trait]
impl ModelCapability for ClaudeVisionClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ModelRequest) -> XrayResult<Value> {
        self.call(&request)
            .await
            .map_err(|e| XrayError::model_invocation(&request.prompt_name, format!("{:#}", e)))
    }
}

/// Append the answer format instructions to a rendered prompt.
fn with_output_instructions(prompt: &str, schema: &Value) -> Result<String> {
    let schema_text = serde_json::to_string_pretty(schema)
        .context("Failed to serialize output schema")?;
    Ok(format!(
        "{}\n\nReturn ONLY a valid JSON object (no markdown, no explanation) matching this JSON schema:\n{}",
        prompt.trim_end(),
        schema_text
    ))
}

/// Extract JSON from a string that might be wrapped in markdown code blocks.
fn extract_json(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_marker = &trimmed[start + 7..];
        if let Some(end) = after_marker.find("```") {
            return after_marker[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_marker = &trimmed[start + 3..];
        if let Some(end) = after_marker.find("```") {
            return after_marker[..end].trim().to_string();
        }
    }

    // First { to last } for an object surrounded by prose
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}
