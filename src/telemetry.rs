use opentelemetry::{global, trace::TracerProvider, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{logs::SdkLoggerProvider, trace::SdkTracerProvider, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const SERVICE_NAME: &str = "bashbot";

/// Keeps the OpenTelemetry providers alive so pending batches can be flushed on exit.
#[derive(Default)]
pub struct TelemetryGuard {
    providers: Option<Providers>,
}

struct Providers {
    traces: SdkTracerProvider,
    logs: SdkLoggerProvider,
}

impl TelemetryGuard {
    pub fn shutdown(self) {
        let Some(providers) = self.providers else {
            return;
        };

        if let Err(e) = providers.traces.shutdown() {
            tracing::warn!(err = ?e, "an error occurred when shutting down tracer provider");
        }

        if let Err(e) = providers.logs.shutdown() {
            tracing::warn!(err = ?e, "an error occurred when shutting down logger provider");
        }
    }
}

/// Where and as whom to export traces and logs.
#[derive(Debug, PartialEq, Eq)]
struct OtlpSettings {
    endpoint: String,
    service_name: String,
    service_version: String,
}

impl OtlpSettings {
    /// `None` when no collector endpoint is configured.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|e| !e.trim().is_empty())?;

        Some(OtlpSettings {
            endpoint,
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or_else(|| SERVICE_NAME.to_string()),
            service_version: lookup("OTEL_SERVICE_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    fn resource(&self) -> Resource {
        Resource::builder()
            .with_service_name(self.service_name.clone())
            .with_attribute(KeyValue::new("service.version", self.service_version.clone()))
            .build()
    }

    /// Batch-exporting providers for both signals, sharing one resource.
    fn build_providers(&self) -> anyhow::Result<Providers> {
        let resource = self.resource();

        let spans = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&self.endpoint)
            .build()?;
        let logs = LogExporter::builder()
            .with_tonic()
            .with_endpoint(&self.endpoint)
            .build()?;

        Ok(Providers {
            traces: SdkTracerProvider::builder()
                .with_resource(resource.clone())
                .with_batch_exporter(spans)
                .build(),
            logs: SdkLoggerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(logs)
                .build(),
        })
    }
}

fn default_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("info,bashbot=debug,teloxide=debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Sets up the global subscriber. OTLP export is only wired in when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set; otherwise logs go to stdout only.
pub fn init_telemetry(debug: bool) -> anyhow::Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug));

    let settings = OtlpSettings::from_lookup(|key| std::env::var(key).ok());
    let providers = settings.as_ref().map(OtlpSettings::build_providers).transpose()?;

    if let Some(providers) = &providers {
        global::set_tracer_provider(providers.traces.clone());
    }

    let span_layer = providers.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.traces.tracer(SERVICE_NAME))
    });
    let log_layer = providers
        .as_ref()
        .map(|p| OpenTelemetryTracingBridge::new(&p.logs));

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(span_layer)
        .with(log_layer)
        .try_init()?;

    if let Some(settings) = &settings {
        tracing::info!(
            endpoint = %settings.endpoint,
            service = %settings.service_name,
            "exporting traces and logs over OTLP"
        );
    }

    Ok(TelemetryGuard { providers })
}
