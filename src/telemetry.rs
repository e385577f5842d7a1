use std::sync::Once;

use metrics::{Unit, describe_counter};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

pub(crate) const METRIC_ENTITY_HIT: &str = "brezza_cache_entity_hit_total";
pub(crate) const METRIC_ENTITY_MISS: &str = "brezza_cache_entity_miss_total";
pub(crate) const METRIC_QUERY_HIT: &str = "brezza_cache_query_hit_total";
pub(crate) const METRIC_QUERY_MISS: &str = "brezza_cache_query_miss_total";
pub(crate) const METRIC_INVALIDATION: &str = "brezza_cache_invalidation_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
#[error("telemetry initialization failed: {0}")]
pub struct TelemetryError(String);

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::from(logging.level).into())
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
        .map_err(|err| TelemetryError(format!("failed to install tracing subscriber: {err}")))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_ENTITY_HIT,
            Unit::Count,
            "Total number of entity-cache hits."
        );
        describe_counter!(
            METRIC_ENTITY_MISS,
            Unit::Count,
            "Total number of entity-cache misses."
        );
        describe_counter!(
            METRIC_QUERY_HIT,
            Unit::Count,
            "Total number of query-cache hits."
        );
        describe_counter!(
            METRIC_QUERY_MISS,
            Unit::Count,
            "Total number of query-cache misses."
        );
        describe_counter!(
            METRIC_INVALIDATION,
            Unit::Count,
            "Total number of cache invalidations, labeled by kind and scope."
        );
    });
}
