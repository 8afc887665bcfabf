//! Visualize stage: annotated image with areas of concern highlighted.
//!
//! The image URL is rendered inline in the prompt. Whether the analysis text
//! is rendered too is decided by the [`SizeGuard`]; the derived flag is the
//! only thing the template looks at, an empty analysis string is not treated
//! specially.

use tracing::info;

use crate::adapter::ModelAdapter;
use crate::error::XrayResult;
use crate::prompt::PromptTemplate;
use crate::schema::{VisualizationInput, VisualizationRequest, VisualizationResult};
use crate::size_guard::{SizeDecision, SizeGuard};

pub const PROMPT_NAME: &str = "visualize_analysis_results";

/// Text rendered in place of the analysis when it was left out.
pub const OMITTED_NOTICE: &str =
    "Analysis Results: The analysis results were omitted to avoid exceeding the token limit.";

const PROMPT: &str = r#"You are an expert medical image analyst. Given an X-ray image URL, your task is to visualize the X-ray image, highlighting areas of concern.  If no analysis results are provided, return the original image URL.

X-ray Image URL: {{ xrayImageUrl }}
{% if includeAnalysisResults %}
Analysis Results:
{{ analysisResults }}
{% else %}
Analysis Results: The analysis results were omitted to avoid exceeding the token limit.
{% endif %}

Ensure the visualized image clearly highlights areas of concern based on the analysis results. If no analysis results are provided, return the original image URL.
"#;

/// Result of the visualize stage together with the size decision that shaped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationOutcome {
    pub result: VisualizationResult,
    pub size: SizeDecision,
}

#[derive(Debug, Clone)]
pub struct VisualizeFlow {
    template: PromptTemplate,
    guard: SizeGuard,
}

impl Default for VisualizeFlow {
    fn default() -> Self {
        Self {
            template: PromptTemplate::new(PROMPT_NAME, PROMPT),
            guard: SizeGuard::default(),
        }
    }
}

impl VisualizeFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guard(guard: SizeGuard) -> Self {
        Self {
            guard,
            ..Self::default()
        }
    }

    /// Build the request actually sent, deriving the inclusion flag.
    pub fn prepare(&self, input: &VisualizationInput) -> (VisualizationRequest, SizeDecision) {
        let size = self.guard.evaluate(&input.xray_image_url, &input.analysis_results);
        let request = VisualizationRequest {
            xray_image_url: input.xray_image_url.clone(),
            analysis_results: input.analysis_results.clone(),
            include_analysis_results: size.include_analysis_results,
        };
        (request, size)
    }

    /// The returned URL is opaque: it is not compared with the input URL.
    pub async fn run(&self, adapter: &ModelAdapter, input: &VisualizationInput) -> XrayResult<VisualizationOutcome> {
        let (request, size) = self.prepare(input);
        let result: VisualizationResult = adapter.invoke(&self.template, &request).await?;

        info!(
            combined_length = size.combined_length,
            analysis_omitted = size.analysis_omitted(),
            "Visualization complete"
        );

        Ok(VisualizationOutcome { result, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedModel;
    use serde_json::json;
    use std::sync::Arc;

    fn adapter_with(model: &Arc<ScriptedModel>) -> ModelAdapter {
        ModelAdapter::new(model.clone())
    }

    fn answering(url: &str) -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel::new().answer(PROMPT_NAME, json!({"visualizedImageUrl": url})))
    }

    #[tokio::test]
    async fn test_analysis_rendered_when_within_budget() {
        let model = answering("https://cdn.example.org/annotated.png");
        let input = VisualizationInput {
            xray_image_url: "https://pacs.example.org/1.png".to_string(),
            analysis_results: "Transverse fracture of the mid-shaft tibia.".to_string(),
        };

        let outcome = VisualizeFlow::new().run(&adapter_with(&model), &input).await.unwrap();
        assert!(outcome.size.include_analysis_results);
        assert_eq!(outcome.result.visualized_image_url, "https://cdn.example.org/annotated.png");

        let prompt = &model.calls()[0].prompt;
        assert!(prompt.contains("X-ray Image URL: https://pacs.example.org/1.png"));
        assert!(prompt.contains("Analysis Results:\nTransverse fracture of the mid-shaft tibia."));
        assert!(!prompt.contains(OMITTED_NOTICE));
        assert!(model.calls()[0].media.is_empty());
    }

    #[tokio::test]
    async fn test_analysis_omitted_over_budget() {
        let model = answering("https://pacs.example.org/1.png");
        let flow = VisualizeFlow::with_guard(SizeGuard::with_limit(40));
        let input = VisualizationInput {
            xray_image_url: "https://pacs.example.org/1.png".to_string(),
            analysis_results: "A long description of a comminuted fracture.".to_string(),
        };

        let outcome = flow.run(&adapter_with(&model), &input).await.unwrap();
        assert!(outcome.size.analysis_omitted());

        let prompt = &model.calls()[0].prompt;
        assert!(prompt.contains(OMITTED_NOTICE));
        assert!(!prompt.contains("comminuted"));
    }

    #[tokio::test]
    async fn test_empty_analysis_keeps_flag_authoritative() {
        let model = answering("https://pacs.example.org/1.png");
        let input = VisualizationInput {
            xray_image_url: "https://pacs.example.org/1.png".to_string(),
            analysis_results: String::new(),
        };

        let outcome = VisualizeFlow::new().run(&adapter_with(&model), &input).await.unwrap();
        assert!(outcome.size.include_analysis_results);

        let prompt = &model.calls()[0].prompt;
        assert!(prompt.contains("Analysis Results:\n\n"));
        assert!(!prompt.contains(OMITTED_NOTICE));
    }

    #[test]
    fn test_prepare_derives_flag() {
        let flow = VisualizeFlow::with_guard(SizeGuard::with_limit(5));
        let (request, size) = flow.prepare(&VisualizationInput {
            xray_image_url: "abc".to_string(),
            analysis_results: "def".to_string(),
        });
        assert!(!request.include_analysis_results);
        assert_eq!(size.combined_length, 6);
        assert_eq!(request.analysis_results, "def");
    }
}
