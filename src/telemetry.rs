use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Env;

const DEFAULT_FILTER: &str = "portal_api=debug,db_check=debug,register_smoke=debug,tower_http=info";

/// init
///
/// Installs the global subscriber. `RUST_LOG` wins over the default filter. Local runs
/// get pretty output; production emits JSON for log aggregators.
pub fn init(env: &Env) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    match env {
        Env::Local => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        Env::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
