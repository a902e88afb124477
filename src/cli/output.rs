/// Output formatting: text, table and JSON modes. TTY detection.
use std::io::{IsTerminal, Write};

use comfy_table::{CellAlignment, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;

use super::args::OutputFormat;
use crate::airport::format::{summary_lines, traffic_line};
use crate::types::{RegistryStatus, ServerOutput, SummaryOutput, TrafficLogOutput};

/// Resolve the effective output format, handling `--json` flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    if fmt == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        fmt
    }
}

/// Output context passed to all formatters.
pub struct OutputCtx {
    pub format: OutputFormat,
    pub no_header: bool,
    /// When true, emit phase timings at debug level.
    pub debug: bool,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(fmt: OutputFormat, json_flag: bool, no_header: bool, debug: bool) -> Self {
        Self {
            format: resolve_format(fmt, json_flag),
            no_header,
            debug,
        }
    }

    /// Start a named debug timer. Logs elapsed on drop only when `--debug` is set.
    #[must_use]
    pub fn timer(&self, label: &'static str) -> DebugTimer {
        DebugTimer::new(label, self.debug)
    }
}

// --- Summary ---

/// Write the summary, followed by any registry changes, to stdout.
pub fn write_summary(view: &SummaryOutput, ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(view),
        OutputFormat::Compact => print_compact_json(view),
        OutputFormat::Table | OutputFormat::Auto => {
            for line in summary_lines(view) {
                println!("{line}");
            }
            for line in change_notices(view) {
                println!("{line}");
            }
        }
    }
}

/// Text notices for the registry changes recorded on `view`, in discovery order.
#[must_use]
pub fn change_notices(view: &SummaryOutput) -> Vec<String> {
    let mut lines: Vec<String> = view
        .changes
        .iter()
        .map(|c| {
            format!(
                "-- updating {} subscription\n\told: {}\n\tnew: {}",
                view.airport, c.old, c.new
            )
        })
        .collect();
    match view.registry {
        Some(RegistryStatus::Saved) => lines.push("-- update complete".to_owned()),
        Some(RegistryStatus::DryRun) => lines.push("-- dry run: registry not written".to_owned()),
        Some(RegistryStatus::Unchanged | RegistryStatus::Failed) | None => {}
    }
    lines
}

// --- Servers ---

/// Write the server list to stdout.
pub fn write_servers(rows: &[ServerOutput], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(rows),
        OutputFormat::Compact => print_compact_json(rows),
        OutputFormat::Table | OutputFormat::Auto => println!("{}", servers_table(rows, ctx.no_header)),
    }
}

/// Build the server table. Name and tags are left-aligned, the rest centred.
#[must_use]
pub fn servers_table(rows: &[ServerOutput], no_header: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if !no_header {
        table.set_header(["NAME", "STATUS", "RATE", "TYPE", "UPDATED", "TAGS"]);
    }
    for row in rows {
        table.add_row([
            row.name.as_str(),
            row.status.as_str(),
            row.rate.as_str(),
            row.kind.as_str(),
            row.updated.as_str(),
            &row.tags.join(", "),
        ]);
    }
    for (index, alignment) in [
        CellAlignment::Left,
        CellAlignment::Center,
        CellAlignment::Center,
        CellAlignment::Center,
        CellAlignment::Center,
        CellAlignment::Left,
    ]
    .into_iter()
    .enumerate()
    {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(alignment);
        }
    }
    table
}

// --- Traffic log ---

/// Write the traffic log to stdout.
pub fn write_traffic_log(rows: &[TrafficLogOutput], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(rows),
        OutputFormat::Compact => print_compact_json(rows),
        OutputFormat::Table | OutputFormat::Auto => {
            for row in rows {
                println!("{}", traffic_line(row));
            }
        }
    }
}

// --- Error output ---

/// Write a structured error to stderr.
pub fn write_error(err: &crate::types::ErrorOutput, format: OutputFormat) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    match format {
        OutputFormat::Json | OutputFormat::Compact => {
            let s = serde_json::to_string_pretty(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        OutputFormat::Table | OutputFormat::Auto => {
            let _ = writeln!(out, "Error: {}", err.error.message);
        }
    }
}

// --- Debug timer ---

/// A RAII timer that logs elapsed milliseconds on drop.
///
/// Created via [`OutputCtx::timer`]. Does nothing when `debug` is false.
pub struct DebugTimer {
    label: &'static str,
    start: std::time::Instant,
    active: bool,
}

impl DebugTimer {
    #[must_use]
    fn new(label: &'static str, active: bool) -> Self {
        Self {
            label,
            start: std::time::Instant::now(),
            active,
        }
    }
}

impl Drop for DebugTimer {
    fn drop(&mut self) {
        if self.active {
            let ms = self.start.elapsed().as_secs_f64() * 1000.0;
            tracing::debug!(phase = self.label, "{ms:.2}ms");
        }
    }
}

// --- Generic JSON helpers ---

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

fn print_compact_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}
