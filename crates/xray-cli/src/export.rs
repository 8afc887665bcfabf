//! Plain-text export of a pipeline report.

use std::path::Path;

use anyhow::{Context, Result};
use xray_core::PipelineReport;

pub const DEFAULT_EXPORT_FILE: &str = "xray_analysis_results.txt";

/// Text written by `--export`.
pub fn render_report(image_url: &str, report: &PipelineReport) -> String {
    format!(
        "Image URL: {}\nAnalysis: {}\nSummary: {}",
        image_url, report.analysis, report.summary
    )
}

pub fn write_report(path: &Path, image_url: &str, report: &PipelineReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, render_report(image_url, report))
        .with_context(|| format!("Failed to write {}", path.display()))
}
