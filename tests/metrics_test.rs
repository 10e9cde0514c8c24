//! Tests for metrics emitted by retry and selection.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::time::Duration;

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use huginn::{
    GeminiApi, GenerationRequest, ModelSelector, RawResponse, RetryPolicy, telemetry, with_retry,
};

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn retries_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let policy = RetryPolicy::generation().base_delay(Duration::from_millis(1));

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                with_retry(&policy, "generate_content", || async {
                    Ok(RawResponse {
                        status: 503,
                        body: String::new(),
                    })
                })
                .await
            })
        })
    });
    assert_eq!(result.unwrap().status, 503);

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn generate_records_request_and_fallback_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": "models/gemini-2.0-flash" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "hi" }] } }]
        })))
        .mount(&server)
        .await;

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let selector = ModelSelector::new(GeminiApi::with_base_url(server.uri()));
    let request = GenerationRequest::new("key", "hello").unwrap();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(selector.generate(&request))
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::FALLBACKS_TOTAL), 1);
    assert!(has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS));
}
