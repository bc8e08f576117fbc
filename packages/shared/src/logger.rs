//! Logging setup utilities for the Huddle binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose log output is controlled by the default level.
const WORKSPACE_CRATES: [&str; 3] = ["huddle_shared", "huddle_server", "huddle_client"];

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for the workspace crates, the binary and the
/// HTTP tracing layer. The log level can be overridden using the `RUST_LOG`
/// environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "huddle-server", "huddle-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use huddle_shared::logger::setup_logger;
///
/// setup_logger("huddle-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the `EnvFilter` directive used when `RUST_LOG` is not set.
pub fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|name| format!("{}={}", name, default_log_level))
        .collect();

    let binary_target = binary_name.replace('-', "_");
    if !WORKSPACE_CRATES.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }
    directives.push(format!("tower_http={}", default_log_level));

    directives.join(",")
}
