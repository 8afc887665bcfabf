//! Single-stage commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use xray_core::flows::{SummarizeFlow, SummaryVariant};
use xray_core::Pipeline;

use crate::{image, output};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Image to analyze: http(s) URL, data: URL or local file
    pub image: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Analysis text given inline or read from a file.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct AnalysisText {
    /// Analysis text
    #[arg(long)]
    pub text: Option<String>,

    /// File containing the analysis text
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl AnalysisText {
    fn load(&self) -> Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read analysis from {}", path.display())),
            (None, None) => anyhow::bail!("Provide --text or --file"),
        }
    }
}

#[derive(Args)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub analysis: AnalysisText,

    /// Prompt wording: results or generated
    #[arg(long, default_value = "results")]
    pub variant: SummaryVariant,
}

#[derive(Args)]
pub struct VisualizeArgs {
    /// Image to annotate: http(s) URL, data: URL or local file
    pub image: String,

    #[command(flatten)]
    pub analysis: AnalysisText,
}

pub async fn analyze(args: AnalyzeArgs, pipeline: &Pipeline) -> Result<()> {
    let image_url = image::resolve(&args.image)?;
    let result = pipeline.analyze(&image_url).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_section("Analysis", &result.analysis);
        output::print_section("Severity", &result.severity);
    }
    Ok(())
}

pub async fn summarize(args: SummarizeArgs, pipeline: Pipeline) -> Result<()> {
    let text = args.analysis.load()?;
    let pipeline = pipeline.with_summarize(SummarizeFlow::with_variant(args.variant));

    let result = pipeline.summarize(&text).await?;
    output::print_section("Summary", &result.summary);
    Ok(())
}

pub async fn visualize(args: VisualizeArgs, pipeline: &Pipeline) -> Result<()> {
    let image_url = image::resolve(&args.image)?;
    let text = args.analysis.load()?;

    let outcome = pipeline.visualize(&image_url, &text).await?;
    if outcome.size.analysis_omitted() {
        println!(
            "{} Analysis omitted from the prompt ({} > {} characters)",
            "!".yellow(),
            outcome.size.combined_length,
            outcome.size.limit
        );
    }
    output::print_section("Visualized image", &outcome.result.visualized_image_url);
    Ok(())
}
