//! Deterministic in-process model.
//!
//! Answers by prompt name from a fixed script and records every request, so
//! the pipeline can be exercised without contacting a real model.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{ModelCapability, ModelRequest};
use crate::error::{XrayError, XrayResult};

#[derive(Debug, Clone)]
enum Scripted {
    Answer(Value),
    Fail(String),
}

/// Model that replays scripted answers keyed by prompt name.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `prompt_name` with `value`, whatever its shape.
    pub fn answer(mut self, prompt_name: impl Into<String>, value: Value) -> Self {
        self.script.insert(prompt_name.into(), Scripted::Answer(value));
        self
    }

    /// Fail every call to `prompt_name`.
    pub fn fail(mut self, prompt_name: impl Into<String>, message: impl Into<String>) -> Self {
        self.script.insert(prompt_name.into(), Scripted::Fail(message.into()));
        self
    }

    /// All requests received so far, in arrival order.
    pub fn calls(&self) -> Vec<ModelRequest> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Requests received for one prompt.
    pub fn calls_for(&self, prompt_name: &str) -> Vec<ModelRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.prompt_name == prompt_name)
            .collect()
    }
}

#[async_trait]
impl ModelCapability for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: ModelRequest) -> XrayResult<Value> {
        let prompt_name = request.prompt_name.clone();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match self.script.get(&prompt_name) {
            Some(Scripted::Answer(value)) => Ok(value.clone()),
            Some(Scripted::Fail(message)) => Err(XrayError::model_invocation(prompt_name, message.clone())),
            None => Err(XrayError::model_invocation(prompt_name, "no scripted answer")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(name: &str) -> ModelRequest {
        ModelRequest {
            prompt_name: name.to_string(),
            prompt: "p".to_string(),
            media: Vec::new(),
            output_schema: Value::Null,
        }
    }

    #[tokio::test]
    async fn test_scripted_answers_and_records() {
        let model = ScriptedModel::new()
            .answer("a", json!({"ok": true}))
            .fail("b", "quota exceeded");

        assert_eq!(model.generate(request("a")).await.unwrap(), json!({"ok": true}));

        let err = model.generate(request("b")).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));

        assert!(model.generate(request("c")).await.is_err());
        assert_eq!(model.calls().len(), 3);
        assert_eq!(model.calls_for("a").len(), 1);
    }
}
