/// `log` command: print the traffic log, one line per record.
use chrono::Local;

use crate::airport::client::fetch;
use crate::airport::format::traffic_rows;
use crate::airport::payload::{Resource, decode_traffic_log};
use crate::airport::{AirportError, AirportProfile};
use crate::cli::OutputCtx;
use crate::cli::output::write_traffic_log;

/// Run `airq log`.
///
/// # Errors
///
/// Returns `AirportError` on request failure or a malformed response.
pub fn run(profile: &AirportProfile, ctx: &OutputCtx) -> Result<(), AirportError> {
    let t_fetch = ctx.timer("fetch");
    let body = fetch(profile, Resource::TrafficLog)?;
    drop(t_fetch);

    let records = decode_traffic_log(body)?;
    let rows = traffic_rows(&records, &Local)?;
    write_traffic_log(&rows, ctx);
    Ok(())
}
