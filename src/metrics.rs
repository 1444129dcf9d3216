// Prometheus metrics definitions for the game backend.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Game sessions created.
    pub static ref SESSIONS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "bulls_sessions_created_total",
        "Game sessions created",
    )
    .unwrap();

    /// Game sessions finished with a correct guess.
    pub static ref SESSIONS_WON_TOTAL: IntCounter = IntCounter::new(
        "bulls_sessions_won_total",
        "Game sessions won",
    )
    .unwrap();

    /// Game sessions removed by the idle sweeper.
    pub static ref SESSIONS_EXPIRED_TOTAL: IntCounter = IntCounter::new(
        "bulls_sessions_expired_total",
        "Game sessions removed after being idle",
    )
    .unwrap();

    /// Guess submissions, by reply kind (err, win, info).
    pub static ref GUESSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bulls_guesses_total", "Guess submissions by reply kind"),
        &["kind"],
    )
    .unwrap();

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bulls_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Attempts needed to win a game.
    pub static ref ATTEMPTS_TO_WIN: Histogram = Histogram::with_opts(
        HistogramOpts::new("bulls_attempts_to_win", "Attempts needed to win a game")
            .buckets(vec![1.0, 2.0, 4.0, 6.0, 8.0, 10.0, 15.0, 20.0, 30.0, 50.0]),
    )
    .unwrap();

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "bulls_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SESSIONS_CREATED_TOTAL.clone()),
        Box::new(SESSIONS_WON_TOTAL.clone()),
        Box::new(SESSIONS_EXPIRED_TOTAL.clone()),
        Box::new(GUESSES_TOTAL.clone()),
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(ATTEMPTS_TO_WIN.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("metric registration skipped: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Normalize a URL path for metric labels. Only known routes keep their
/// path; everything else collapses to one label to bound cardinality.
pub fn normalize_path(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/guess" => "/guess",
        "/health" => "/health",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_paths() {
        assert_eq!(normalize_path("/guess"), "/guess");
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_normalize_unknown_paths() {
        assert_eq!(normalize_path("/favicon.ico"), "other");
        assert_eq!(normalize_path("/guess/1234"), "other");
    }

    #[test]
    fn test_gather_metrics_after_register() {
        register_metrics();
        // A second call only logs about duplicates.
        register_metrics();
        SESSIONS_CREATED_TOTAL.inc();
        let output = gather_metrics();
        assert!(output.contains("bulls_sessions_created_total"));
    }

    #[test]
    fn test_metric_increments() {
        let before = GUESSES_TOTAL.with_label_values(&["info"]).get();
        GUESSES_TOTAL.with_label_values(&["info"]).inc();
        assert_eq!(GUESSES_TOTAL.with_label_values(&["info"]).get(), before + 1);

        ATTEMPTS_TO_WIN.observe(7.0);
        API_REQUEST_DURATION_SECONDS
            .with_label_values(&["/guess"])
            .observe(0.002);
        API_REQUESTS_TOTAL
            .with_label_values(&["POST", "/guess", "200"])
            .inc();
    }
}
