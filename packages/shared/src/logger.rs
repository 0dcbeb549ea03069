//! Logging setup for the Hibiki relay.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Every target in `targets` (crate names and the binary name) gets
/// `default_log_level`; `tower_http` is included so request traces show up.
/// `RUST_LOG` overrides the whole filter when set.
///
/// # Examples
///
/// ```no_run
/// use hibiki_shared::logger::setup_logger;
///
/// setup_logger(&["hibiki_server", "hibiki-server"], "debug");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| target.replace('-', "_"))
        .chain(std::iter::once("tower_http".to_string()))
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}
