/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod log;
pub mod servers;
pub mod summary;

use crate::airport::{AirportError, RegistryStore};
use crate::cli::OutputCtx;
use crate::cli::args::{Cli, Command};

/// Load the registry, resolve the airport, then dispatch the view mode.
///
/// The airport is resolved before any network call so a typo fails fast.
///
/// # Errors
///
/// Returns `AirportError` on any command failure.
pub fn dispatch(cli: &Cli, ctx: &OutputCtx) -> Result<(), AirportError> {
    let mut store = RegistryStore::new(&cli.config);

    let t_load = ctx.timer("load_registry");
    let mut doc = store.load()?;
    drop(t_load);
    tracing::debug!(path = %store.path().display(), "registry ready");

    let profile = doc.airport(&cli.airport)?;
    tracing::debug!(airport = %cli.airport, host = %profile.host, "airport resolved");

    match &cli.command {
        Command::Summary(args) => {
            summary::run(&cli.airport, &profile, &mut doc, &mut store, args, ctx)
        }
        Command::Servers => servers::run(&profile, ctx),
        Command::Log => log::run(&profile, ctx),
    }
}
