// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "info";
const VERBOSE_DIRECTIVE: &str = "info,sec_catalog=debug";

/// Installs the global tracing subscriber, writing to stderr so stdout
/// carries only tables and export messages.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between crate-level
/// debug output and plain info.
pub fn setup_logging(verbose: bool) {
    let fallback = if verbose { VERBOSE_DIRECTIVE } else { DEFAULT_DIRECTIVE };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // try_init: a second call (tests, embedding) keeps the first subscriber.
    if fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init()
        .is_err()
    {
        tracing::debug!("Logging already initialized");
        return;
    }

    tracing::debug!("Logging setup complete (fallback filter {:?})", fallback);
}
