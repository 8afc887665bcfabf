//! Summarize stage: lay-readable summary of the analysis text.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::adapter::ModelAdapter;
use crate::error::{XrayError, XrayResult};
use crate::prompt::PromptTemplate;
use crate::schema::{SummaryRequest, SummaryResult};

pub const RESULTS_PROMPT_NAME: &str = "summarize_analysis_results";
pub const GENERATED_PROMPT_NAME: &str = "generate_analysis_summary";

const RESULTS_PROMPT: &str = r#"You are a medical expert summarizing X-ray analysis results.

Summarize the following analysis results, including potential issues and their severity, in a way that is easy for both doctors and patients to understand.

Analysis Results: {{ analysisResults }}"#;

const GENERATED_PROMPT: &str = r#"You are a medical expert tasked with generating a summary of an X-ray analysis.

Summarize the following analysis results, highlighting potential issues and their severity, in a way that is easy for both doctors and patients to understand.

Analysis Results: {{ analysisResults }}"#;

/// Prompt wording used by the summarize stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryVariant {
    /// Summary of the analysis results (the pipeline default).
    #[default]
    Results,
    /// Generated summary highlighting issues.
    Generated,
}

impl fmt::Display for SummaryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryVariant::Results => write!(f, "results"),
            SummaryVariant::Generated => write!(f, "generated"),
        }
    }
}

impl FromStr for SummaryVariant {
    type Err = XrayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "results" => Ok(SummaryVariant::Results),
            "generated" => Ok(SummaryVariant::Generated),
            other => Err(XrayError::config(format!("Unknown summary variant: {}", other))),
        }
    }
}

/// Condenses technical analysis text. The text is sent verbatim.
#[derive(Debug, Clone)]
pub struct SummarizeFlow {
    template: PromptTemplate,
}

impl Default for SummarizeFlow {
    fn default() -> Self {
        Self::with_variant(SummaryVariant::default())
    }
}

impl SummarizeFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(variant: SummaryVariant) -> Self {
        let template = match variant {
            SummaryVariant::Results => PromptTemplate::new(RESULTS_PROMPT_NAME, RESULTS_PROMPT),
            SummaryVariant::Generated => PromptTemplate::new(GENERATED_PROMPT_NAME, GENERATED_PROMPT),
        };
        Self { template }
    }

    pub async fn run(&self, adapter: &ModelAdapter, request: &SummaryRequest) -> XrayResult<SummaryResult> {
        let result: SummaryResult = adapter.invoke(&self.template, request).await?;
        info!(summary_chars = result.summary.len(), prompt = self.template.name(), "Summary complete");
        Ok(result)
    }
}
