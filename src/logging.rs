use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g. `doctidy=debug`.
pub const LOG_ENV: &str = "DOCTIDY_LOG";

fn default_level(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Install the stderr subscriber. `DOCTIDY_LOG` wins over the flags when set.
pub fn init_logger(verbose: bool, quiet: bool) {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| default_level(verbose, quiet).to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    // a second install (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .try_init();
}
