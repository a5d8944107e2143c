// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "tax_doc_extractor=info";
/// Directive used for `--verbose` when `RUST_LOG` is unset.
pub const VERBOSE_DIRECTIVE: &str = "tax_doc_extractor=debug";

/// Installs the global subscriber. `RUST_LOG` wins over `fallback`.
///
/// Output goes to stderr so `--stdout` stays valid JSON. The library never
/// calls this; only the binary does.
pub fn setup_logging(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Logging initialised ({})", fallback);
}
