//! Subscriber setup for the command-line tool.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary.

use std::io::IsTerminal;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Filter directives, checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "LOOKML_LINEAGE_LOG";

const DEFAULT_DIRECTIVE: &str = "lookml_lineage=info";
const VERBOSE_DIRECTIVE: &str = "lookml_lineage=debug";

/// Install a stderr fmt subscriber. Later calls do nothing.
pub fn init_logging(verbose: bool) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = env_filter(verbose);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(false)
            .try_init();
    });
}

fn env_filter(verbose: bool) -> EnvFilter {
    let directives = std::env::var(LOG_ENV_VAR)
        .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
        .ok()
        .filter(|d| !d.trim().is_empty());

    let default = if verbose {
        VERBOSE_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    };
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}
