//! End-to-end pipeline scenarios against in-process models.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use xray_core::flows::{analyze, summarize, visualize};
use xray_core::{
    ModelCapability, ModelRequest, Pipeline, ScriptedModel, StageScheduling, XrayError, XrayResult,
    TOKEN_LIMIT,
};

const SMALL_IMAGE: &str = "data:image/png;base64,AAAA";

fn script_with_analysis(analysis: &str) -> ScriptedModel {
    ScriptedModel::new()
        .answer(analyze::PROMPT_NAME, json!({"analysis": analysis, "severity": "mild"}))
        .answer(summarize::RESULTS_PROMPT_NAME, json!({"summary": "Minor finding."}))
        .answer(visualize::PROMPT_NAME, json!({"visualizedImageUrl": "https://cdn.example.org/annotated.png"}))
}

#[tokio::test]
async fn small_image_includes_analysis_in_visualize_prompt() {
    let analysis = "Frontal chest radiograph. Small left pleural effusion.";
    let model = Arc::new(script_with_analysis(analysis));
    let pipeline = Pipeline::new(model.clone());

    let report = pipeline.run(SMALL_IMAGE).await.unwrap();
    assert!(!report.analysis_omitted);
    assert_eq!(report.summary, "Minor finding.");

    let analyze_call = &model.calls_for(analyze::PROMPT_NAME)[0];
    assert_eq!(analyze_call.media, vec![SMALL_IMAGE.to_string()]);

    let visualize_call = &model.calls_for(visualize::PROMPT_NAME)[0];
    assert!(visualize_call.prompt.contains(SMALL_IMAGE));
    assert!(visualize_call.prompt.contains(&format!("Analysis Results:\n{}", analysis)));
}

/// Log sink for the fmt subscriber.
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

#[tokio::test]
async fn oversized_analysis_is_omitted_from_visualize_prompt() {
    let image = "https://x/";
    assert_eq!(image.len(), 10);
    let analysis = "a".repeat(1_000_000);

    let model = Arc::new(script_with_analysis(&analysis));
    let pipeline = Pipeline::new(model.clone());

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let report = {
        // current-thread runtime, so the default subscriber covers the whole run
        let _guard = tracing::subscriber::set_default(subscriber);
        pipeline.run(image).await.unwrap()
    };
    assert!(report.analysis_omitted);

    let logs = logs.text();
    assert!(logs.contains("WARN"));
    assert!(logs.contains("Omitting analysis results"));
    assert!(logs.contains("combined_length=1000010"));
    assert_eq!(report.analysis.len(), 1_000_000);

    let outcome = pipeline.visualize(image, &analysis).await.unwrap();
    assert_eq!(outcome.size.combined_length, 1_000_010);
    assert_eq!(outcome.size.limit, TOKEN_LIMIT);
    assert!(!outcome.size.include_analysis_results);

    let visualize_call = &model.calls_for(visualize::PROMPT_NAME)[0];
    assert!(visualize_call.prompt.contains(visualize::OMITTED_NOTICE));
    assert!(!visualize_call.prompt.contains(&"a".repeat(100)));

    // summarize still receives the full text
    let summarize_call = &model.calls_for(summarize::RESULTS_PROMPT_NAME)[0];
    assert!(summarize_call.prompt.contains(&analysis));
}

#[tokio::test]
async fn malformed_analysis_aborts_before_downstream_stages() {
    let model = Arc::new(
        ScriptedModel::new()
            .answer(analyze::PROMPT_NAME, json!({"analysis": "Normal study."}))
            .answer(summarize::RESULTS_PROMPT_NAME, json!({"summary": "x"}))
            .answer(visualize::PROMPT_NAME, json!({"visualizedImageUrl": "y"})),
    );

    for scheduling in [StageScheduling::Sequential, StageScheduling::Concurrent] {
        let pipeline = Pipeline::new(model.clone()).with_scheduling(scheduling);
        let err = pipeline.run(SMALL_IMAGE).await.unwrap_err();
        assert!(err.is_stage_failure());
        assert!(matches!(err, XrayError::Validation { .. }));
    }

    assert!(model.calls_for(summarize::RESULTS_PROMPT_NAME).is_empty());
    assert!(model.calls_for(visualize::PROMPT_NAME).is_empty());
}

#[tokio::test]
async fn failing_analyze_call_aborts_the_run() {
    let model = Arc::new(ScriptedModel::new().fail(analyze::PROMPT_NAME, "connection reset"));
    let pipeline = Pipeline::new(model.clone());

    let err = pipeline.run(SMALL_IMAGE).await.unwrap_err();
    assert!(matches!(err, XrayError::ModelInvocation { .. }));
    assert_eq!(model.calls().len(), 1);
}

/// Holds the summarize answer until the visualize request has arrived, so the
/// run can only finish if both stages are in flight at the same time.
struct RendezvousModel {
    inner: ScriptedModel,
    visualize_seen: Notify,
}

#[async_trait]
impl ModelCapability for RendezvousModel {
    fn name(&self) -> &str {
        "rendezvous"
    }

    async fn generate(&self, request: ModelRequest) -> XrayResult<Value> {
        match request.prompt_name.as_str() {
            summarize::RESULTS_PROMPT_NAME => self.visualize_seen.notified().await,
            visualize::PROMPT_NAME => self.visualize_seen.notify_one(),
            _ => {}
        }
        self.inner.generate(request).await
    }
}

#[tokio::test]
async fn concurrent_stages_see_the_same_analysis() {
    let analysis = "Oblique foot view. Fifth metatarsal base fracture.";
    let model = Arc::new(RendezvousModel {
        inner: script_with_analysis(analysis),
        visualize_seen: Notify::new(),
    });
    let pipeline = Pipeline::new(model.clone()).with_scheduling(StageScheduling::Concurrent);

    let report = tokio::time::timeout(Duration::from_secs(5), pipeline.run(SMALL_IMAGE))
        .await
        .expect("stages did not run concurrently")
        .unwrap();
    assert_eq!(report.analysis, analysis);

    let summarize_prompt = &model.inner.calls_for(summarize::RESULTS_PROMPT_NAME)[0].prompt;
    let visualize_prompt = &model.inner.calls_for(visualize::PROMPT_NAME)[0].prompt;
    assert!(summarize_prompt.contains(analysis));
    assert!(visualize_prompt.contains(analysis));
}

/// Never answers.
struct StalledModel;

#[async_trait]
impl ModelCapability for StalledModel {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn generate(&self, _request: ModelRequest) -> XrayResult<Value> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn cancellation_stops_a_pending_run() {
    let pipeline = Pipeline::new(Arc::new(StalledModel));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.run_with_cancel(SMALL_IMAGE, cancel),
    )
    .await
    .expect("cancellation was not observed");

    assert!(matches!(result, Err(XrayError::Cancelled)));
}

#[tokio::test]
async fn repeated_summaries_always_validate() {
    let model = Arc::new(script_with_analysis("Normal hand series."));
    let pipeline = Pipeline::new(model);

    for _ in 0..3 {
        let summary = pipeline.summarize("Normal hand series.").await.unwrap();
        assert!(!summary.summary.is_empty());
    }
}
