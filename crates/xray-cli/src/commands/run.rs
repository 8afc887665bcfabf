//! Full pipeline command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xray_core::{Pipeline, PipelineReport, StageScheduling, XrayError, XrayResult};

use crate::{export, image, output};

#[derive(Args)]
pub struct RunArgs {
    /// Image to analyze: http(s) URL, data: URL or local file
    pub image: String,

    /// Run summarize and visualize at the same time
    #[arg(long)]
    pub concurrent: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write image URL, analysis and summary to a text file
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = export::DEFAULT_EXPORT_FILE)]
    pub export: Option<PathBuf>,
}

pub async fn execute(args: RunArgs, pipeline: Pipeline) -> Result<()> {
    let image_url = image::resolve(&args.image)?;
    let scheduling = if args.concurrent {
        StageScheduling::Concurrent
    } else {
        StageScheduling::Sequential
    };
    let pipeline = pipeline.with_scheduling(scheduling);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            on_interrupt.cancel();
        }
    });

    if !args.json {
        println!("{} Analyzing image: {}", "→".dimmed(), output::short_reference(&image_url));
    }

    let report = finish_run(pipeline.run_with_cancel(&image_url, cancel).await)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
    }

    if let Some(path) = args.export {
        export::write_report(&path, &image_url, &report)?;
        if !args.json {
            println!("{} Exported: {}", "✓".green().bold(), path.display());
        }
    }

    Ok(())
}

/// A cancelled run is reported on stderr and still fails the command, so
/// nothing is written to stdout and the exit status is non-zero.
fn finish_run(result: XrayResult<PipelineReport>) -> Result<PipelineReport> {
    match result {
        Ok(report) => Ok(report),
        Err(XrayError::Cancelled) => {
            warn!("Run cancelled before completion");
            Err(XrayError::Cancelled.into())
        }
        Err(e) => Err(e.into()),
    }
}
