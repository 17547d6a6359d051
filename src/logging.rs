//! Tracing subscriber setup.
//!
//! Logs always go to stderr so CSV previews on stdout stay clean. `RUST_LOG`
//! overrides the default filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console logging for `econ download` / `econ list`.
pub fn init(verbose: bool) {
    let default = if verbose { "econ_series=debug,info" } else { "econ_series=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    install(filter);
}

/// The dashboard owns the terminal; only log when `RUST_LOG` asks for it.
pub fn init_for_dashboard() {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        install(filter);
    }
}

fn install(filter: EnvFilter) {
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
