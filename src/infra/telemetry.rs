use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_FETCH, METRIC_FETCH_ERROR, METRIC_FETCH_MS, METRIC_HIT, METRIC_INVALIDATE, METRIC_MISS,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so CLI commands can print JSON on stdout.
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
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
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
            METRIC_HIT,
            Unit::Count,
            "Post cache reads answered from the snapshot, labelled by op."
        );
        describe_counter!(
            METRIC_MISS,
            Unit::Count,
            "Post cache reads that went to the document store, labelled by op."
        );
        describe_counter!(
            METRIC_FETCH,
            Unit::Count,
            "Full post list fetches issued to the document store."
        );
        describe_counter!(
            METRIC_FETCH_ERROR,
            Unit::Count,
            "Document store reads that failed."
        );
        describe_counter!(
            METRIC_INVALIDATE,
            Unit::Count,
            "Explicit post cache invalidations."
        );
        describe_histogram!(
            METRIC_FETCH_MS,
            Unit::Milliseconds,
            "Post list fetch latency in milliseconds."
        );
    });
}
