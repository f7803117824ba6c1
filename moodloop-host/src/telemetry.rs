//! `tracing` subscriber setup for hosts.

use moodloop_core::config::GeneralConfig;
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured `log_level` applies.
/// Returns `false` if a subscriber was already installed, which is not an
/// error (tests and embedding hosts often install their own).
pub fn init_tracing(general: &GeneralConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&general.log_level));

    let installed = if general.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::debug!(level = %general.log_level, json = general.json_logs, "tracing initialised");
    }
    installed
}
