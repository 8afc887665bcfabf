//! Pipeline orchestrator.
//!
//! ```text
//! Pipeline::run(photo_url)
//!   → analyze(photo_url)                      — must succeed first
//!   → summarize(analysis) ┐ sequential or
//!   → visualize(photo_url, analysis) ┘ concurrent
//!   → PipelineReport
//! ```
//!
//! Any stage failure aborts the run and is returned as-is. There is no partial
//! report.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::adapter::ModelAdapter;
use crate::error::{XrayError, XrayResult};
use crate::flows::{AnalyzeFlow, SummarizeFlow, VisualizationOutcome, VisualizeFlow};
use crate::model::ModelCapability;
use crate::schema::{AnalysisRequest, AnalysisResult, SummaryRequest, SummaryResult, VisualizationInput};

/// How the two stages after analyze are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StageScheduling {
    #[default]
    Sequential,
    Concurrent,
}

/// Aggregate result of a full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub analysis: String,
    pub severity: String,
    pub summary: String,
    pub visualized_image_url: String,
    /// True when the size guard kept the analysis out of the visualize prompt.
    pub analysis_omitted: bool,
}

/// Sequences analyze, summarize and visualize against one model.
#[derive(Clone)]
pub struct Pipeline {
    adapter: ModelAdapter,
    analyze: AnalyzeFlow,
    summarize: SummarizeFlow,
    visualize: VisualizeFlow,
    scheduling: StageScheduling,
}

impl Pipeline {
    pub fn new(model: Arc<dyn ModelCapability>) -> Self {
        Self {
            adapter: ModelAdapter::new(model),
            analyze: AnalyzeFlow::default(),
            summarize: SummarizeFlow::default(),
            visualize: VisualizeFlow::default(),
            scheduling: StageScheduling::default(),
        }
    }

    pub fn with_scheduling(mut self, scheduling: StageScheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    pub fn with_summarize(mut self, flow: SummarizeFlow) -> Self {
        self.summarize = flow;
        self
    }

    pub fn with_visualize(mut self, flow: VisualizeFlow) -> Self {
        self.visualize = flow;
        self
    }

    /// Analyze stage on its own.
    pub async fn analyze(&self, photo_url: &str) -> XrayResult<AnalysisResult> {
        let request = AnalysisRequest {
            photo_url: photo_url.to_string(),
        };
        self.analyze.run(&self.adapter, &request).await
    }

    /// Summarize stage on its own.
    pub async fn summarize(&self, analysis: &str) -> XrayResult<SummaryResult> {
        let request = SummaryRequest {
            analysis_results: analysis.to_string(),
        };
        self.summarize.run(&self.adapter, &request).await
    }

    /// Visualize stage on its own.
    pub async fn visualize(&self, photo_url: &str, analysis: &str) -> XrayResult<VisualizationOutcome> {
        let input = VisualizationInput {
            xray_image_url: photo_url.to_string(),
            analysis_results: analysis.to_string(),
        };
        self.visualize.run(&self.adapter, &input).await
    }

    /// Run all three stages.
    pub async fn run(&self, photo_url: &str) -> XrayResult<PipelineReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id, model = self.adapter.model_name());
        self.run_stages(photo_url).instrument(span).await
    }

    /// Run all three stages, giving up with `Cancelled` once `cancel` fires.
    ///
    /// In-flight model calls are dropped at that point.
    pub async fn run_with_cancel(&self, photo_url: &str, cancel: CancellationToken) -> XrayResult<PipelineReport> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Pipeline run cancelled");
                Err(XrayError::Cancelled)
            }
            report = self.run(photo_url) => report,
        }
    }

    async fn run_stages(&self, photo_url: &str) -> XrayResult<PipelineReport> {
        let analysis = self.analyze(photo_url).await?;

        // Both stages borrow the same immutable analysis text.
        let text = analysis.analysis.as_str();
        let (summary, visualization) = match self.scheduling {
            StageScheduling::Sequential => {
                let summary = self.summarize(text).await?;
                let visualization = self.visualize(photo_url, text).await?;
                (summary, visualization)
            }
            StageScheduling::Concurrent => {
                tokio::try_join!(self.summarize(text), self.visualize(photo_url, text))?
            }
        };

        info!(
            severity = %analysis.severity,
            analysis_omitted = visualization.size.analysis_omitted(),
            "Pipeline complete"
        );

        Ok(PipelineReport {
            analysis: analysis.analysis,
            severity: analysis.severity,
            summary: summary.summary,
            visualized_image_url: visualization.result.visualized_image_url,
            analysis_omitted: visualization.size.analysis_omitted(),
        })
    }
}
