//! Input-size guard for the visualize stage.
//!
//! The image reference is rendered inline into the visualize prompt, so a
//! large data URL plus a long analysis can exceed the model's input budget.
//! When the combined length is over the limit the analysis text is left out.

use serde::Serialize;
use tracing::warn;

/// Budget in UTF-16 code units, the unit browsers and JS runtimes report as a
/// string's length. A character outside the BMP counts as two.
pub const TOKEN_LIMIT: usize = 900_000;

/// Outcome of one size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeDecision {
    pub combined_length: usize,
    pub limit: usize,
    pub include_analysis_results: bool,
}

impl SizeDecision {
    pub fn analysis_omitted(&self) -> bool {
        !self.include_analysis_results
    }
}

/// Decides whether the analysis text fits next to the image reference.
#[derive(Debug, Clone, Copy)]
pub struct SizeGuard {
    limit: usize,
}

impl Default for SizeGuard {
    fn default() -> Self {
        Self { limit: TOKEN_LIMIT }
    }
}

impl SizeGuard {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    /// Evaluate the two inputs. The limit itself is still accepted.
    pub fn evaluate(&self, xray_image_url: &str, analysis_results: &str) -> SizeDecision {
        let combined_length = utf16_len(xray_image_url) + utf16_len(analysis_results);
        let include_analysis_results = combined_length <= self.limit;

        if !include_analysis_results {
            warn!(
                combined_length,
                limit = self.limit,
                "Combined input length exceeds token limit. Omitting analysis results."
            );
        }

        SizeDecision {
            combined_length,
            limit: self.limit,
            include_analysis_results,
        }
    }
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Shared buffer handed to the fmt layer as its writer.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn evaluate_with_logs(xray_image_url: &str, analysis_results: &str) -> (SizeDecision, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let decision = tracing::subscriber::with_default(subscriber, || {
            SizeGuard::default().evaluate(xray_image_url, analysis_results)
        });
        (decision, logs.text())
    }

    #[test]
    fn test_small_input_is_included() {
        let decision = SizeGuard::default().evaluate("data:image/png;base64,AAAA", "No fracture.");
        assert!(decision.include_analysis_results);
        assert_eq!(decision.combined_length, 26 + 12);
        assert_eq!(decision.limit, TOKEN_LIMIT);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let guard = SizeGuard::default();
        let url = "u".repeat(10);

        let at_limit = guard.evaluate(&url, &"a".repeat(TOKEN_LIMIT - 10));
        assert_eq!(at_limit.combined_length, TOKEN_LIMIT);
        assert!(at_limit.include_analysis_results);

        let over = guard.evaluate(&url, &"a".repeat(TOKEN_LIMIT - 9));
        assert!(over.analysis_omitted());
    }

    #[test]
    fn test_counts_utf16_units_not_bytes() {
        let guard = SizeGuard::with_limit(4);
        // four code units, eight bytes
        assert!(guard.evaluate("éé", "éé").include_analysis_results);
        assert!(!guard.evaluate("éé", "ééé").include_analysis_results);
    }

    #[test]
    fn test_surrogate_pair_counts_twice_at_boundary() {
        let url = "https://x/";
        // 899_989 + 1 chars reach the limit, but the emoji is two code units
        let analysis = format!("{}\u{1F600}", "a".repeat(TOKEN_LIMIT - 11));
        assert_eq!(url.chars().count() + analysis.chars().count(), TOKEN_LIMIT);

        let decision = SizeGuard::default().evaluate(url, &analysis);
        assert_eq!(decision.combined_length, TOKEN_LIMIT + 1);
        assert!(decision.analysis_omitted());

        let fits = format!("{}\u{1F600}", "a".repeat(TOKEN_LIMIT - 12));
        assert!(SizeGuard::default().evaluate(url, &fits).include_analysis_results);
    }

    #[test]
    fn test_warning_emitted_only_over_budget() {
        let url = "u".repeat(10);

        let (over, logs) = evaluate_with_logs(&url, &"a".repeat(TOKEN_LIMIT - 9));
        assert!(over.analysis_omitted());
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Omitting analysis results"));
        assert!(logs.contains("combined_length=900001"));

        let (at_limit, logs) = evaluate_with_logs(&url, &"a".repeat(TOKEN_LIMIT - 10));
        assert!(at_limit.include_analysis_results);
        assert!(!logs.contains("Omitting analysis results"));
    }

    #[test]
    fn test_empty_analysis_is_still_included() {
        let decision = SizeGuard::default().evaluate("https://example.org/x.png", "");
        assert!(decision.include_analysis_results);
    }
}
