//! XRay Core Library
//!
//! Model pipeline that analyzes an X-ray image, summarizes the findings and
//! asks for an annotated visualization.

pub mod adapter;
pub mod config;
pub mod error;
pub mod flows;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod schema;
pub mod size_guard;

pub use adapter::ModelAdapter;
pub use config::ModelConfig;
pub use error::{XrayError, XrayResult};
pub use model::{ClaudeVisionClient, ModelCapability, ModelRequest, ScriptedModel};
pub use pipeline::{Pipeline, PipelineReport, StageScheduling};
pub use size_guard::{SizeDecision, SizeGuard, TOKEN_LIMIT};
