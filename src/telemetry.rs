//! Tracing and metrics bootstrap.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(logging.level).into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Init(err.to_string()))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "lesto_cache_hit_total",
            Unit::Count,
            "Total cache hits, labeled by cache."
        );
        describe_counter!(
            "lesto_cache_miss_total",
            Unit::Count,
            "Total cache misses, labeled by cache."
        );
        describe_counter!(
            "lesto_cache_expired_total",
            Unit::Count,
            "Total entries removed because their TTL elapsed."
        );
        describe_counter!(
            "lesto_cache_evict_total",
            Unit::Count,
            "Total entries evicted due to capacity."
        );
        describe_counter!(
            "lesto_store_roundtrip_total",
            Unit::Count,
            "Total queries issued to the document store, labeled by collection."
        );
        describe_histogram!(
            "lesto_store_query_ms",
            Unit::Milliseconds,
            "Document store query latency in milliseconds."
        );
        describe_counter!(
            "lesto_slow_request_total",
            Unit::Count,
            "Total requests slower than the configured threshold."
        );
    });
}
