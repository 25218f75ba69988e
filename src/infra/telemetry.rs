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
            "trendpress_upstream_calls_total",
            Unit::Count,
            "Calls to the generative model and WordPress, labelled by operation and outcome."
        );
        describe_histogram!(
            "trendpress_upstream_call_ms",
            Unit::Milliseconds,
            "Upstream call latency in milliseconds."
        );
        describe_counter!(
            "trendpress_workflow_transitions_total",
            Unit::Count,
            "Workflow stage transitions, labelled by the stage entered."
        );
        describe_counter!(
            "trendpress_publish_total",
            Unit::Count,
            "Draft publish attempts, labelled by outcome."
        );
        describe_gauge!(
            "trendpress_active_sessions",
            Unit::Count,
            "Workflow sessions currently held in memory."
        );
    });
}
