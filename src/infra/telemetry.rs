use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::preview::{
    METRIC_PREVIEW_HIT, METRIC_PREVIEW_MISS, METRIC_PREVIEW_READ_ERROR, METRIC_PREVIEW_REFRESH,
    METRIC_PREVIEW_STALE, METRIC_RENDER_FAILURE, METRIC_RENDER_MS,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
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
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_PREVIEW_HIT,
            Unit::Count,
            "Requests answered from an unexpired, hash-matching cache entry."
        );
        describe_counter!(
            METRIC_PREVIEW_MISS,
            Unit::Count,
            "Requests with no usable cache entry (absent or expired)."
        );
        describe_counter!(
            METRIC_PREVIEW_STALE,
            Unit::Count,
            "Requests whose cache entry no longer matched the entity's fingerprint."
        );
        describe_counter!(
            METRIC_PREVIEW_REFRESH,
            Unit::Count,
            "Requests that bypassed the cache via the refresh flag."
        );
        describe_counter!(
            METRIC_PREVIEW_READ_ERROR,
            Unit::Count,
            "Metadata lookups that failed and were degraded to a miss."
        );
        describe_counter!(
            METRIC_RENDER_FAILURE,
            Unit::Count,
            "Compositor invocations that did not produce a valid image."
        );
        describe_histogram!(
            METRIC_RENDER_MS,
            Unit::Milliseconds,
            "Compositor render latency in milliseconds."
        );
    });
}
