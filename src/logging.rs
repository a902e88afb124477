/// Diagnostic logging to stderr via `tracing`.
use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects `airq=debug` and the
/// default is `warn`. Output goes to stderr so stdout stays clean for piping.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` cannot be parsed or a subscriber is already installed.
pub fn init(debug: bool) -> anyhow::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) => EnvFilter::try_new(&spec).with_context(|| format!("invalid RUST_LOG '{spec}'"))?,
        Err(_) => EnvFilter::new(if debug { "airq=debug" } else { "warn" }),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
