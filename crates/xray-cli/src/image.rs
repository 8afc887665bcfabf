//! Image argument handling.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use xray_core::model::media::{detect_media_type, to_data_url, MediaSource};

/// Turn an image argument into a URL the pipeline accepts.
///
/// `http(s)` and `data:` URLs pass through; anything else is read as a local
/// file and inlined as a base64 data URL.
pub fn resolve(input: &str) -> Result<String> {
    if MediaSource::parse(input).is_some() {
        return Ok(input.trim().to_string());
    }

    let path = Path::new(input);
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file {}", path.display()))?;
    if bytes.is_empty() {
        anyhow::bail!("Image file is empty: {}", path.display());
    }

    let media_type = detect_media_type(input);
    debug!(path = %path.display(), %media_type, bytes = bytes.len(), "Inlining local image");
    Ok(to_data_url(&media_type, &bytes))
}
