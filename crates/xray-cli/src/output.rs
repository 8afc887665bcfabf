//! Terminal output formatting.

use colored::Colorize;
use xray_core::PipelineReport;

/// Longest image reference printed before it is shortened.
const MAX_REFERENCE_LEN: usize = 80;

/// Print a full pipeline report.
pub fn print_report(report: &PipelineReport) {
    println!();
    print_section("Severity", &severity_colored(&report.severity));
    print_section("Analysis", &report.analysis);
    print_section("Summary", &report.summary);
    print_section("Visualized image", &short_reference(&report.visualized_image_url));

    if report.analysis_omitted {
        println!(
            "{} {}",
            "!".yellow(),
            "Analysis was too large to send with the image and was left out of the visualization prompt.".dimmed()
        );
    }
}

/// Print a titled block of text.
pub fn print_section(title: &str, body: &str) {
    println!("{}", title.bold());
    println!("{}", "─".repeat(40));
    println!("{}", body.trim());
    println!();
}

/// Shorten inline data URLs so they do not flood the terminal.
pub fn short_reference(reference: &str) -> String {
    if reference.chars().count() <= MAX_REFERENCE_LEN {
        return reference.to_string();
    }
    let head: String = reference.chars().take(MAX_REFERENCE_LEN).collect();
    format!("{}... ({} chars)", head, reference.chars().count())
}

fn severity_colored(severity: &str) -> String {
    let lower = severity.to_lowercase();
    let colored = if lower.contains("severe") || lower.contains("critical") || lower.contains("high") {
        severity.red().bold()
    } else if lower.contains("moderate") || lower.contains("medium") {
        severity.yellow()
    } else if lower.contains("none") || lower.contains("mild") || lower.contains("low") {
        severity.green()
    } else {
        severity.normal()
    };
    colored.to_string()
}
