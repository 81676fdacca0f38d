use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global subscriber and register metric descriptions.
///
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "bapddang_resolve_total",
            Unit::Count,
            "Resolved food names, labelled by outcome status."
        );
        describe_histogram!(
            "bapddang_resolve_ms",
            Unit::Milliseconds,
            "Latency of one name-resolution batch in milliseconds."
        );
        describe_gauge!(
            "bapddang_catalog_standard_size",
            Unit::Count,
            "Standard foods currently held in the catalog cache."
        );
        describe_gauge!(
            "bapddang_catalog_custom_size",
            Unit::Count,
            "Custom foods currently held in the catalog cache."
        );
        describe_histogram!(
            "bapddang_catalog_load_ms",
            Unit::Milliseconds,
            "Catalog cache load latency in milliseconds."
        );
        describe_counter!(
            "bapddang_stats_propagation_failed_total",
            Unit::Count,
            "Background review-stat updates that failed and were dropped."
        );
    });
}
