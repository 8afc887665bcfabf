//! Analyze stage: radiologist read of the image.

use tracing::info;

use crate::adapter::ModelAdapter;
use crate::error::XrayResult;
use crate::prompt::PromptTemplate;
use crate::schema::{AnalysisRequest, AnalysisResult};

pub const PROMPT_NAME: &str = "analyze_xray_image";

const PROMPT: &str = r#"You are an expert radiologist specializing in analyzing X-ray images for bone fractures and abnormalities.

You will use this information to analyze the X-ray image and identify any potential issues. Your analysis should describe the type of scan, the body part scanned, and a detailed description of any and all findings.

Analyze the following X-ray image and provide a detailed analysis of any potential bone fractures or abnormalities, as well as the severity of the issues found.

X-ray Image: {{ media(url=photoUrl) }}
"#;

/// Produces a structured finding description and a severity.
#[derive(Debug, Clone)]
pub struct AnalyzeFlow {
    template: PromptTemplate,
}

impl Default for AnalyzeFlow {
    fn default() -> Self {
        Self {
            template: PromptTemplate::new(PROMPT_NAME, PROMPT),
        }
    }
}

impl AnalyzeFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// The model's answer is passed through as-is once it satisfies the contract.
    pub async fn run(&self, adapter: &ModelAdapter, request: &AnalysisRequest) -> XrayResult<AnalysisResult> {
        let result: AnalysisResult = adapter.invoke(&self.template, request).await?;
        info!(severity = %result.severity, analysis_bytes = result.analysis.len(), "Analysis complete");
        Ok(result)
    }
}
