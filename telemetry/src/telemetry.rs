use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{SpanExporterBuilder, WithExportConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Config, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    /// OTLP/HTTP collector endpoint. Leave empty to disable span export.
    #[serde(default)]
    pub otlp_endpoint: String,
    pub honeycomb_api_key: Secret<String>,
    pub dataset_name: String,
}

impl TelemetrySettings {
    pub fn export_enabled(&self) -> bool {
        !self.otlp_endpoint.trim().is_empty()
    }
}

/// Compose multiple layers into a tracing subscriber.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
    config: &TelemetrySettings,
    trace_provider: &TracerProvider,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .with(
            tracing_opentelemetry::layer()
                .with_tracer(trace_provider.tracer(config.dataset_name.clone())),
        )
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    let _ = LogTracer::init();
    global::set_text_map_propagator(TraceContextPropagator::new());

    let _ = set_global_default(subscriber);
}

/// Builds the tracer provider. Without an endpoint the provider has no
/// exporter and spans are dropped; with one, spans are batched to the
/// collector on the Tokio runtime.
pub fn init_tracer(trace_config: &TelemetrySettings) -> TracerProvider {
    let resource = Resource::new(vec![KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME.to_string(),
        trace_config.dataset_name.clone(),
    )]);

    if !trace_config.export_enabled() {
        return TracerProvider::builder()
            .with_config(Config::default().with_resource(resource))
            .build();
    }

    let span_exporter = opentelemetry_otlp::new_exporter()
        .http()
        .with_endpoint(trace_config.otlp_endpoint.clone())
        .with_http_client(reqwest::Client::default())
        .with_headers(HashMap::from([
            (
                "x-honeycomb-dataset".into(),
                trace_config.dataset_name.clone(),
            ),
            (
                "x-honeycomb-team".into(),
                trace_config.honeycomb_api_key.expose_secret().into(),
            ),
        ]))
        .with_timeout(std::time::Duration::from_secs(2));

    match SpanExporterBuilder::Http(span_exporter).build_span_exporter() {
        Ok(exporter) => TracerProvider::builder()
            .with_config(Config::default().with_resource(resource))
            .with_batch_exporter(exporter, runtime::Tokio)
            .build(),
        Err(e) => {
            eprintln!("Failed to build OTLP span exporter, spans will not be exported: {e}");
            TracerProvider::builder()
                .with_config(Config::default().with_resource(resource))
                .build()
        }
    }
}

/// Flushes any spans still queued in the batch exporter.
pub fn flush_tracer(trace_provider: &TracerProvider) {
    for result in trace_provider.force_flush() {
        if let Err(e) = result {
            eprintln!("Failed to flush spans: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TelemetrySettings;
    use secrecy::Secret;

    fn settings(endpoint: &str) -> TelemetrySettings {
        TelemetrySettings {
            otlp_endpoint: endpoint.to_string(),
            honeycomb_api_key: Secret::new("key".to_string()),
            dataset_name: "donor-sync".to_string(),
        }
    }

    #[test]
    fn blank_endpoint_disables_export() {
        assert!(!settings("").export_enabled());
        assert!(!settings("   ").export_enabled());
    }

    #[test]
    fn endpoint_enables_export() {
        assert!(settings("https://api.honeycomb.io").export_enabled());
    }

    #[test]
    fn tracer_without_endpoint_builds_outside_a_runtime() {
        let provider = super::init_tracer(&settings(""));
        super::flush_tracer(&provider);
    }
}
