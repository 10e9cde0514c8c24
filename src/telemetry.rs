//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus,
//! statsd); without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).

/// Total `generate` calls.
///
/// Labels: `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// End-to-end `generate` duration in seconds, discovery included.
pub const REQUEST_DURATION_SECONDS: &str = "huginn_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `operation` ("list_models" | "generate_content").
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Times the selector moved past a version or candidate.
///
/// Labels: `version`, `reason` ("listing_failed" | "mismatch" | "incapable").
pub const FALLBACKS_TOTAL: &str = "huginn_fallbacks_total";
