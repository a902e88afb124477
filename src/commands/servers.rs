/// `servers` command: list the airport's servers as a table.
use chrono::Local;

use crate::airport::client::fetch;
use crate::airport::format::server_rows;
use crate::airport::payload::{Resource, decode_servers};
use crate::airport::{AirportError, AirportProfile};
use crate::cli::OutputCtx;
use crate::cli::output::write_servers;

/// Run `airq servers`.
///
/// # Errors
///
/// Returns `AirportError` on request failure or a malformed response.
pub fn run(profile: &AirportProfile, ctx: &OutputCtx) -> Result<(), AirportError> {
    let t_fetch = ctx.timer("fetch");
    let body = fetch(profile, Resource::Servers)?;
    drop(t_fetch);

    let servers = decode_servers(body)?;
    let rows = server_rows(&servers, &Local)?;
    write_servers(&rows, ctx);
    Ok(())
}
