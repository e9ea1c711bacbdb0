//! Tracing setup for the `hostscope` binary.
//!
//! `hostscope search` prints its report on stdout, so every log line goes to
//! stderr and the report can be piped or redirected untouched.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `level`. With `json` each event is one JSON object
/// per line. Only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let text = (!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));
    let structured = json.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(structured)
        .try_init()
        .ok();
}
