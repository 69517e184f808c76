//! Tracing initialisation for StoryPipe binaries.
//!
//! Call [`init_tracing`] once at startup. Safe to call repeatedly — the
//! global subscriber can only be installed once per process, and later
//! calls are ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// * `json` — emit newline-delimited JSON log lines instead of the
///   human-readable format.
/// * `verbose` — default to DEBUG instead of INFO when `RUST_LOG` is
///   not set. `RUST_LOG` always wins when present.
pub fn init_tracing(json: bool, verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}
