use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::sentry::sentry_layer;

const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Install the global subscriber: `RUST_LOG`-driven filter, formatted output
/// and, when `with_sentry` is set, the Sentry bridge.
pub fn init_tracing(with_sentry: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(with_sentry.then(sentry_layer))
        .init();
}
