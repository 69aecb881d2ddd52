// Telemetry module for structured logging, metrics, and tracing

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "bookstore-api";

/// Initialize structured logging
///
/// This function sets up the tracing subscriber with:
/// - JSON or human-readable formatting
/// - Log levels from `RUST_LOG`, falling back to the configured level
/// - Optional OpenTelemetry integration when an OTLP endpoint is given
#[tracing::instrument(skip_all)]
pub fn init_logging(log_level: &str, json: bool, tracing_endpoint: Option<&str>) -> Result<()> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = filter_from(env_directives.as_deref(), log_level)?;

    let fmt_layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_filter(env_filter)
            .boxed()
    };

    let registry = tracing_subscriber::registry().with(fmt_layer);

    if let Some(endpoint) = tracing_endpoint {
        let tracer = init_tracer(endpoint)?;
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        registry
            .with(telemetry_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    } else {
        registry
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    }

    tracing::info!(
        log_level = log_level,
        json = json,
        tracing_endpoint = tracing_endpoint,
        "Logging initialized"
    );

    Ok(())
}

/// Build the log filter; valid `RUST_LOG` directives win over the configured level
fn filter_from(env_directives: Option<&str>, log_level: &str) -> Result<EnvFilter> {
    if let Some(filter) = env_directives.and_then(|d| EnvFilter::try_new(d).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(log_level)
        .map_err(|e| anyhow::anyhow!("Failed to create env filter '{}': {}", log_level, e))
}

/// Initialize OpenTelemetry tracer with OTLP exporter
#[tracing::instrument(skip_all)]
fn init_tracer(endpoint: &str) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_sdk::runtime::Tokio;

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to build span exporter: {}", e))?;

    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", SERVICE_NAME),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .build();

    global::set_tracer_provider(tracer_provider.clone());
    let tracer = tracer_provider.tracer(SERVICE_NAME);

    tracing::info!(endpoint = endpoint, "OpenTelemetry tracer initialized");
    Ok(tracer)
}

/// Shutdown OpenTelemetry tracer provider
///
/// This should be called on graceful shutdown to flush remaining spans
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Install the Prometheus recorder and describe the book metrics
///
/// The returned handle renders the exposition text served on `/metrics`.
#[tracing::instrument(skip_all)]
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    describe_counter!(
        "book_operations_total",
        "Total number of book operations by operation and outcome"
    );
    describe_histogram!(
        "book_operation_duration_seconds",
        "Duration of book operations in seconds"
    );

    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

/// Outcome label for a finished book operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    Invalid,
    Conflict,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NotFound => "not_found",
            Outcome::Invalid => "invalid",
            Outcome::Conflict => "conflict",
            Outcome::Error => "error",
        }
    }
}

/// Record one book operation and how long it took
#[inline]
pub fn record_book_operation(operation: &'static str, outcome: Outcome, duration_seconds: f64) {
    counter!(
        "book_operations_total",
        "operation" => operation,
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("book_operation_duration_seconds", "operation" => operation)
        .record(duration_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_configured_directives() {
        let filter = filter_from(None, "api=info,common=debug,tower_http=debug").unwrap();
        assert!(filter.to_string().contains("tower_http=debug"));
    }

    #[test]
    fn test_filter_rejects_invalid_level() {
        assert!(filter_from(None, "books=loud").is_err());
    }

    #[test]
    fn test_filter_prefers_environment() {
        let filter = filter_from(Some("common=trace"), "info").unwrap();
        assert!(filter.to_string().contains("common=trace"));
    }

    #[test]
    fn test_filter_ignores_invalid_environment() {
        let filter = filter_from(Some("books=loud"), "warn").unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_init_logging_only_once() {
        let _ = init_logging("info", false, None);
        assert!(init_logging("info", true, None).is_err());
    }

    #[test]
    fn test_recorded_operations_are_rendered() {
        let handle = init_metrics().unwrap();
        record_book_operation("create", Outcome::Success, 0.01);
        record_book_operation("get", Outcome::NotFound, 0.002);

        let rendered = handle.render();
        assert!(rendered.contains("book_operations_total"));
        assert!(rendered.contains("operation=\"create\""));
        assert!(rendered.contains("outcome=\"not_found\""));
        assert!(rendered.contains("book_operation_duration_seconds"));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(Outcome::Conflict.as_str(), "conflict");
        assert_eq!(Outcome::Invalid.as_str(), "invalid");
    }
}
