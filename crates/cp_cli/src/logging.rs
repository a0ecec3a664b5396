//! Log output for the CLI.
//!
//! ```bash
//! COMPREHEND_LOG=debug comprehend compile app.js
//! COMPREHEND_LOG="cp_desugar=trace" comprehend compile app.js
//! ```
//!
//! Nothing is installed unless `COMPREHEND_LOG` or `RUST_LOG` is set.

use tracing_subscriber::EnvFilter;

/// `COMPREHEND_LOG` takes precedence over `RUST_LOG`.
fn build_filter() -> Option<EnvFilter> {
    if let Ok(val) = std::env::var("COMPREHEND_LOG") {
        Some(EnvFilter::builder().parse_lossy(val))
    } else if std::env::var("RUST_LOG").is_ok() {
        Some(EnvFilter::from_default_env())
    } else {
        None
    }
}

/// Install the global subscriber. Output goes to stderr so it never mixes
/// with compiled code on stdout.
pub fn init_tracing() {
    let Some(filter) = build_filter() else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
