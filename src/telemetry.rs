//! Tracing subscriber setup.
//!
//! `LOG_LEVEL` takes `EnvFilter` directives. Without it the crate logs its
//! own targets (`iq_backend`, `auth`, `assessment`, `store`) more verbosely
//! than the HTTP stack. `LOG_FORMAT=json` emits one JSON object per event;
//! anything else gives the human-readable format. Request spans come from the
//! router's `TraceLayer`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "info,assessment=debug,iq_backend=debug,auth=debug,store=info,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
