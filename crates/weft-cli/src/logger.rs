//! Logging setup for the weft CLI.
//!
//! Logs go to stderr so stdout carries nothing but the JSON document.
//!
//! The filter is chosen in this order:
//! 1. `--verbose`: debug for the weft crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info for the weft crates

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "weft_core=debug,weft_scan=debug,weft_analyzer=debug,weft_cli=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "weft_core=info,weft_scan=info,weft_analyzer=info,weft_cli=info";

/// Pick the log filter for the given flags.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    // The subscriber is process-global, so only the filters are tested here.

    #[test]
    fn test_verbose_filter_enables_debug() {
        let filter = filter_for(true, false);
        assert_eq!(filter.max_level_hint(), Some(tracing::level_filters::LevelFilter::DEBUG));
    }

    #[test]
    fn test_quiet_filter_is_errors_only() {
        let filter = filter_for(false, true);
        assert_eq!(filter.max_level_hint(), Some(tracing::level_filters::LevelFilter::ERROR));
    }
}
