//! Subscriber initialization

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Console logging to stderr with `RUST_LOG` filtering (default `info`).
///
/// Only the first initializer of the process takes effect.
pub fn init_telemetry(service_name: &str) -> InitResult {
    let mut outcome: InitResult = Ok(());
    INIT.call_once(|| {
        outcome = tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .try_init()
            .map_err(Into::into);

        tracing::info!(service.name = service_name, "Telemetry initialized");
    });
    outcome
}

/// JSON-lines logging, one object per event.
pub fn init_json_telemetry(service_name: &str) -> InitResult {
    let mut outcome: InitResult = Ok(());
    INIT.call_once(|| {
        outcome = tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr).with_current_span(true))
            .try_init()
            .map_err(Into::into);

        tracing::info!(service.name = service_name, format = "json", "Telemetry initialized");
    });
    outcome
}

/// Console logging plus span export to an OTLP collector (e.g. `http://localhost:4317`).
///
/// Must be called from within a Tokio runtime.
pub fn init_with_otlp(service_name: &str, endpoint: &str) -> InitResult {
    let mut outcome: InitResult = Ok(());
    INIT.call_once(|| {
        outcome = install_otlp(service_name, endpoint);
    });
    outcome
}

fn install_otlp(service_name: &str, endpoint: &str) -> InitResult {
    use opentelemetry_otlp::WithExportConfig;
    use tracing_opentelemetry::OpenTelemetryLayer;

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
            opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                "service.name",
                service_name.to_string(),
            )]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(OpenTelemetryLayer::new(tracer))
        .try_init()?;

    tracing::info!(
        service.name = service_name,
        otlp.endpoint = endpoint,
        "Telemetry initialized with OpenTelemetry"
    );
    Ok(())
}

/// Flush pending spans. Call before process exit when OTLP export is enabled.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
