//! `tracing` subscriber setup shared by the CLI and the desktop form.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!(
            "warn,coal_signoff={default_level},signoff_desktop={default_level}"
        )));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(verbose).compact())
        .try_init();
}
