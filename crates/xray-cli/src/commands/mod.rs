//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use xray_core::{ClaudeVisionClient, ModelConfig, Pipeline};

pub mod run;
pub mod stage;

/// XRay Insight - X-ray analysis, summary and visualization
#[derive(Parser)]
#[command(name = "xray")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML model configuration file
    #[arg(short, long, global = true, env = "XRAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model to use (overrides config and XRAY_MODEL)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: analyze, summarize, visualize
    Run(run::RunArgs),

    /// Analyze an image only
    Analyze(stage::AnalyzeArgs),

    /// Summarize existing analysis text
    Summarize(stage::SummarizeArgs),

    /// Visualize an image with existing analysis text
    Visualize(stage::VisualizeArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let pipeline = self.build_pipeline()?;

        match self.command {
            Commands::Run(args) => run::execute(args, pipeline).await,
            Commands::Analyze(args) => stage::analyze(args, &pipeline).await,
            Commands::Summarize(args) => stage::summarize(args, pipeline).await,
            Commands::Visualize(args) => stage::visualize(args, &pipeline).await,
        }
    }

    fn build_pipeline(&self) -> Result<Pipeline> {
        let mut config = ModelConfig::load(self.config.as_deref())?;
        if let Some(model) = &self.model {
            config.model = model.clone();
        }

        let client = ClaudeVisionClient::from_config(&config)?;
        Ok(Pipeline::new(Arc::new(client)))
    }
}
