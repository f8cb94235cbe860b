//! Tracing subscriber setup for the `wisewhisk` binary.

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "wisewhisk_core=info,wisewhisk=info";

/// Builds the env filter, honouring `RUST_LOG` and the verbose flag.
pub fn build_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("wisewhisk_core=debug,wisewhisk=debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Builds the stderr subscriber, as JSON lines or human-readable text.
pub fn build_subscriber(json: bool, verbose: bool) -> Box<dyn Subscriber + Send + Sync> {
    let registry = Registry::default().with(build_filter(verbose));

    if json {
        Box::new(registry.with(fmt::layer().json().with_target(true).with_writer(std::io::stderr)))
    } else {
        Box::new(registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)))
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout stays clean for replies.
///
/// Calling this twice is harmless: the second registration is ignored.
pub fn init_tracing(json: bool, verbose: bool) {
    if let Err(e) = tracing::subscriber::set_global_default(build_subscriber(json, verbose)) {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
}
