//! Model invocation adapter.
//!
//! The one place where contracts are enforced: the input is checked before the
//! template is rendered and the model's answer is checked before it is handed
//! back as a typed record. No retries happen here.

use std::sync::Arc;

use tracing::debug;

use crate::error::{XrayError, XrayResult};
use crate::model::{ModelCapability, ModelRequest};
use crate::prompt::PromptTemplate;
use crate::schema::{self, Contract, SchemaContract};

/// Wraps a model capability with contract checks and template rendering.
#[derive(Clone)]
pub struct ModelAdapter {
    model: Arc<dyn ModelCapability>,
}

impl ModelAdapter {
    pub fn new(model: Arc<dyn ModelCapability>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Render `template` against `input` and return the model's answer as `O`.
    ///
    /// # Errors
    ///
    /// - `Validation` if `input` or the answer breaks its contract
    /// - `ModelInvocation` if rendering or the model call fails
    pub async fn invoke<I, O>(&self, template: &PromptTemplate, input: &I) -> XrayResult<O>
    where
        I: Contract,
        O: Contract,
    {
        let input_value = schema::to_checked_value(input)?;
        let rendered = template.render(&input_value).map_err(|e| match e {
            XrayError::Template(message) => XrayError::model_invocation(template.name(), message),
            other => other,
        })?;

        let request = ModelRequest {
            prompt_name: template.name().to_string(),
            prompt: rendered.text,
            media: rendered.media,
            output_schema: SchemaContract::of::<O>().json_schema().clone(),
        };

        debug!(
            prompt = template.name(),
            model = self.model.name(),
            input = I::NAME,
            output = O::NAME,
            prompt_chars = request.prompt.len(),
            media = request.media.len(),
            "Invoking model"
        );

        let answer = self.model.generate(request).await?;
        schema::validate::<O>(answer)
    }
}
