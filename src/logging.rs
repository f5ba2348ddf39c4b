use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Default filter for a `-v` count: warnings, then info, then debug for this
/// crate.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "census_lookup=warn",
        1 => "census_lookup=info",
        2 => "census_lookup=debug",
        _ => "census_lookup=trace,info",
    }
}

/// Install a stderr formatter. `RUST_LOG` takes precedence over `verbose`.
/// Later calls are no-ops.
pub fn init_logging(verbose: u8) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(verbose > 1))
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_filter(0), "census_lookup=warn");
        assert_eq!(default_filter(2), "census_lookup=debug");
        assert!(default_filter(7).starts_with("census_lookup=trace"));
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(0);
        init_logging(3);
    }
}
