//! Prometheus metrics for the incident service.
//!
//! Covers incident intake and the AI enrichment loop:
//! - attempts per outcome (success, invalid, transient, timeout)
//! - terminal results per status
//! - end-to-end enrichment duration, backoff included
//!
//! # Example
//! ```no_run
//! use smart_incident_service::metrics::ENRICHMENT_RESULTS_TOTAL;
//!
//! ENRICHMENT_RESULTS_TOTAL.with_label_values(&["ENRICHED"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, GaugeVec, Histogram, HistogramOpts, Opts, Registry};

const NAMESPACE: &str = "smart_incident_service";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Incident Metrics
    // ============================================================================

    /// Total number of incidents accepted through the API
    pub static ref INCIDENTS_CREATED_TOTAL: Counter = Counter::with_opts(
        Opts::new("incidents_created_total", "Total number of incidents created")
            .namespace(NAMESPACE)
    ).expect("Failed to create INCIDENTS_CREATED_TOTAL metric");

    // ============================================================================
    // Enrichment Metrics
    // ============================================================================

    /// Total number of AI calls made by the enrichment coordinator
    ///
    /// Labels: outcome (success, invalid, transient, timeout)
    pub static ref ENRICHMENT_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("enrichment_attempts_total", "Total number of AI enrichment attempts")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create ENRICHMENT_ATTEMPTS_TOTAL metric");

    /// Total number of enrichments that reached a terminal status
    ///
    /// Labels: status (ENRICHED, FAILED)
    pub static ref ENRICHMENT_RESULTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("enrichment_results_total", "Total number of settled enrichments")
            .namespace(NAMESPACE),
        &["status"]
    ).expect("Failed to create ENRICHMENT_RESULTS_TOTAL metric");

    /// Total number of AI calls abandoned at the per-attempt timeout
    pub static ref ENRICHMENT_TIMEOUTS_TOTAL: Counter = Counter::with_opts(
        Opts::new("enrichment_timeouts_total", "Total number of timed out AI calls")
            .namespace(NAMESPACE)
    ).expect("Failed to create ENRICHMENT_TIMEOUTS_TOTAL metric");

    /// Enrichment duration in seconds, retries and backoff included
    pub static ref ENRICHMENT_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "enrichment_duration_seconds",
            "Enrichment duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 60.0])
    ).expect("Failed to create ENRICHMENT_DURATION_SECONDS metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Application build info
    ///
    /// Labels: version, git_commit
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Application build information")
            .namespace(NAMESPACE),
        &["version", "git_commit"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Register all metrics with [`PROMETHEUS_REGISTRY`]
///
/// Call once at startup. A second call fails with `AlreadyReg`.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(INCIDENTS_CREATED_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(ENRICHMENT_ATTEMPTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ENRICHMENT_RESULTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ENRICHMENT_TIMEOUTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ENRICHMENT_DURATION_SECONDS.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;

    BUILD_INFO
        .with_label_values(&[
            env!("CARGO_PKG_VERSION"),
            option_env!("GIT_COMMIT").unwrap_or("unknown"),
        ])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Encode the registry in the Prometheus text exposition format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
