/// `summary` command: show subscription status, then sync the registry.
use chrono::Local;

use crate::airport::client::fetch;
use crate::airport::format::summary_view;
use crate::airport::payload::{Resource, decode_summary};
use crate::airport::registry::RegistrySink;
use crate::airport::{AirportError, AirportProfile, RegistryDocument, UrlChange, reconcile};
use crate::cli::OutputCtx;
use crate::cli::args::SummaryArgs;
use crate::cli::output::write_summary;
use crate::types::{RegistryStatus, UrlChangeOutput};

/// Run `airq summary`.
///
/// The summary is rendered and printed even when the registry write fails;
/// the write error is returned afterwards so the operator sees both.
///
/// # Errors
///
/// Returns `AirportError` on request failure, a malformed response, or a
/// failed registry write.
pub fn run<S: RegistrySink>(
    airport: &str,
    profile: &AirportProfile,
    doc: &mut RegistryDocument,
    sink: &mut S,
    args: &SummaryArgs,
    ctx: &OutputCtx,
) -> Result<(), AirportError> {
    let t_fetch = ctx.timer("fetch");
    let body = fetch(profile, Resource::Subscribe)?;
    drop(t_fetch);

    let summary = decode_summary(body)?;
    let mut view = summary_view(airport, &summary, Local::now().timestamp(), &Local)?;

    let t_sync = ctx.timer("reconcile");
    let result = reconcile(airport, &summary.subscribe_url, doc, sink, args.dry_run);
    drop(t_sync);

    let (changes, status, failure) = match result {
        Ok(outcome) => (outcome.changes, outcome.registry, None),
        Err(unsaved) => (unsaved.changes, RegistryStatus::Failed, Some(unsaved.source)),
    };
    view.changes = changes.into_iter().map(change_to_output).collect();
    view.registry = Some(status);

    write_summary(&view, ctx);
    failure.map_or(Ok(()), Err)
}

fn change_to_output(change: UrlChange) -> UrlChangeOutput {
    UrlChangeOutput {
        index: change.index,
        old: change.old,
        new: change.new,
    }
}
