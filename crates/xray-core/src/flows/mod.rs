//! Stage flows.
//!
//! Each flow owns its prompt template and calls the model exactly once
//! through the [`ModelAdapter`](crate::adapter::ModelAdapter).

pub mod analyze;
pub mod summarize;
pub mod visualize;

pub use analyze::AnalyzeFlow;
pub use summarize::{SummarizeFlow, SummaryVariant};
pub use visualize::{VisualizeFlow, VisualizationOutcome};
