//! External model capability.
//!
//! The pipeline only knows the model through [`ModelCapability`]: a rendered
//! prompt plus attached media goes in, a JSON value comes out. Whether that
//! value matches the stage contract is checked by the adapter, not here.

pub mod claude;
pub mod media;
pub mod scripted;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::XrayResult;

pub use claude::ClaudeVisionClient;
pub use scripted::ScriptedModel;

/// A single structured-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Template name, used for logging and by scripted models for routing.
    pub prompt_name: String,
    /// Fully rendered prompt text.
    pub prompt: String,
    /// Image references (`data:` or `http(s)` URLs) to attach.
    pub media: Vec<String>,
    /// JSON Schema the answer is expected to follow.
    pub output_schema: Value,
}

/// An opaque model that answers structured prompts.
#[async_trait]
pub trait ModelCapability: Send + Sync {
    /// Name for logging (e.g. the model identifier).
    fn name(&self) -> &str;

    /// Run one generation and return the raw JSON answer.
    ///
    /// # Errors
    ///
    /// Returns `XrayError::ModelInvocation` when the call fails or the answer
    /// is not JSON.
    async fn generate(&self, request: ModelRequest) -> XrayResult<Value>;
}
