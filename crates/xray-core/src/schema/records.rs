//! Stage input and output records.
//!
//! Field doc comments are exported as schema descriptions, so they are
//! written for the model as much as for the reader.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Contract;

/// Input of the analyze stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// The URL of the X-ray image.
    pub photo_url: String,
}

/// Output of the analyze stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// A detailed analysis of the X-ray image, including potential bone fractures,
    /// abnormalities, and other relevant observations. The analysis should describe
    /// the type of scan, the body part scanned, and a detailed description of any
    /// and all findings.
    pub analysis: String,
    /// The severity of the potential issues found in the X-ray image.
    pub severity: String,
}

/// Input of the summarize stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    /// The AI analysis results of the X-ray image.
    pub analysis_results: String,
}

/// Output of the summarize stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    /// A textual summary of the AI analysis results, including potential issues
    /// and their severity.
    pub summary: String,
}

/// Caller-facing input of the visualize stage. The size-guard flag is derived
/// from it and never supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationInput {
    /// The URL of the X-ray image.
    pub xray_image_url: String,
    /// The analysis results of the X-ray image.
    pub analysis_results: String,
}

/// Request actually rendered into the visualize prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationRequest {
    /// The URL of the X-ray image.
    pub xray_image_url: String,
    /// The analysis results. Omitted from the prompt when the combined input is
    /// too large.
    pub analysis_results: String,
    /// Whether the analysis results can be passed to the model.
    pub include_analysis_results: bool,
}

/// Output of the visualize stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationResult {
    /// The URL of the X-ray image with highlighted areas of concern.
    pub visualized_image_url: String,
}

impl Contract for AnalysisRequest {
    const NAME: &'static str = "AnalysisRequest";
}

impl Contract for AnalysisResult {
    const NAME: &'static str = "AnalysisResult";
}

impl Contract for SummaryRequest {
    const NAME: &'static str = "SummaryRequest";
}

impl Contract for SummaryResult {
    const NAME: &'static str = "SummaryResult";
}

impl Contract for VisualizationInput {
    const NAME: &'static str = "VisualizationInput";
}

impl Contract for VisualizationRequest {
    const NAME: &'static str = "VisualizationRequest";
}

impl Contract for VisualizationResult {
    const NAME: &'static str = "VisualizationResult";
}
