//! Tracing setup for the node.
//!
//! Filtering follows `RUST_LOG` when set, defaulting to `info` for our
//! crates and `warn` for everything else. Sled in particular is chatty
//! at debug.

use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogFormatArg;

const DEFAULT_FILTER: &str = "warn,attest_node=info,attest_protocol=info";

pub fn init_logging(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormatArg::Pretty => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        LogFormatArg::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_current_span(false)
                .init();
        }
    }
}
