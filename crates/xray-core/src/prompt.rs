//! Prompt templates rendered with Tera.
//!
//! Templates see the serialized stage input as their context, so placeholders
//! use the camelCase wire names (`{{ analysisResults }}`). Two constructs are
//! available beyond plain substitution:
//!
//! - `{% if flag %}…{% else %}…{% endif %}` for conditional blocks
//! - `{{ media(url=photoUrl) }}` which attaches the referenced image to the
//!   model request and leaves a short marker in the prompt text

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tera::{Context, Tera};

use crate::error::{XrayError, XrayResult};

/// A named prompt template owned by a stage flow.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    text: String,
}

/// Result of rendering a template against an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub text: String,
    /// Media references attached through `media(url=…)`, in order of appearance.
    pub media: Vec<String>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against a JSON object input.
    ///
    /// Each call builds its own Tera instance so renders share no state.
    pub fn render(&self, input: &Value) -> XrayResult<RenderedPrompt> {
        let context = Context::from_value(input.clone())
            .map_err(|e| XrayError::Template(format!("{}: {}", self.name, e)))?;

        let collected = Arc::new(Mutex::new(Vec::new()));
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_function(
            "media",
            MediaFunction {
                collected: Arc::clone(&collected),
            },
        );
        tera.add_raw_template(&self.name, &self.text)
            .map_err(|e| XrayError::Template(format!("{}: {}", self.name, error_chain(&e))))?;

        let text = tera
            .render(&self.name, &context)
            .map_err(|e| XrayError::Template(format!("{}: {}", self.name, error_chain(&e))))?;

        let media = collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Ok(RenderedPrompt { text, media })
    }
}

/// Tera function backing `media(url=…)`.
struct MediaFunction {
    collected: Arc<Mutex<Vec<String>>>,
}

impl tera::Function for MediaFunction {
    fn call(&self, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| tera::Error::msg("media() requires a string `url` argument"))?;

        let mut collected = self.collected.lock().unwrap_or_else(PoisonError::into_inner);
        collected.push(url.to_string());

        Ok(tera::Value::String(format!("[image {}]", collected.len())))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Tera wraps the useful message in `source()`; flatten it for the error text.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = std::error::Error::source(inner);
    }
    message
}
