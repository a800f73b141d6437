use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const CRATES: [&str; 3] = ["textura_cli", "textura_core", "textura_config"];

/// Install the stderr subscriber. `RUST_LOG` wins over `verbosity`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init(verbosity: u8) -> bool {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let default_directives = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .is_ok()
}
