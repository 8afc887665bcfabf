//! Media reference helpers.

use base64::Engine;

/// An image reference split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Inline `data:<type>;base64,<payload>` URL.
    Inline { media_type: String, data: String },
    /// Remote image to be fetched.
    Remote { url: String },
}

impl MediaSource {
    /// Classify a media reference.
    pub fn parse(reference: &str) -> Option<Self> {
        let trimmed = reference.trim();
        if let Some(rest) = trimmed.strip_prefix("data:") {
            let (header, data) = rest.split_once(',')?;
            let media_type = header
                .strip_suffix(";base64")?
                .split(';')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("image/png")
                .to_string();
            return Some(Self::Inline {
                media_type,
                data: data.to_string(),
            });
        }

        let lower = trimmed.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Some(Self::Remote {
                url: trimmed.to_string(),
            });
        }

        None
    }
}

/// Build a `data:` URL from raw image bytes.
pub fn to_data_url(media_type: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", media_type, b64)
}

/// Detect media type from a URL or path extension.
pub fn detect_media_type(url: &str) -> String {
    let lower = url.to_lowercase();
    if lower.contains(".png") {
        "image/png".to_string()
    } else if lower.contains(".jpg") || lower.contains(".jpeg") {
        "image/jpeg".to_string()
    } else if lower.contains(".gif") {
        "image/gif".to_string()
    } else if lower.contains(".webp") {
        "image/webp".to_string()
    } else {
        "image/png".to_string()
    }
}
