/// Pure view formatters: API payloads in, rendered output types out.
///
/// Two unit conventions coexist in the summary usage line and both are kept
/// as the airport panels show them: used traffic is divided by `1000^3`
/// (decimal GB) while the quota is divided by `2^30` (binary GiB, still
/// labelled `GB`). A plan with a 10 GiB quota and 10 GiB used therefore
/// reads `10.74GB ... / 10.00GB`. Do not "fix" one side without the other.
use std::fmt::Display;

use chrono::TimeZone;

use super::errors::AirportError;
use super::payload::{Resource, ServerEntry, SubscriptionSummary, TrafficLogEntry};
use crate::types::{ServerOutput, SummaryOutput, TrafficLogOutput};

/// Units of the byte ladder, smallest first. Anything past the last one is `PB`.
const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

const SECONDS_PER_DAY: i64 = 86_400;
const DECIMAL_GB: f64 = 1_000_000_000.0;
const BINARY_GB: f64 = 1_073_741_824.0;

/// Status label for an online server.
pub const STATUS_ONLINE: &str = "🟢 online";
/// Status label for an offline server.
pub const STATUS_OFFLINE: &str = "🔴 offline";

/// Second-precision timestamp format.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Minute-precision timestamp format (server table).
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render a byte count with a 1024-based unit and two decimals, e.g. `1.95 KB`.
///
/// Escalation stops at `TB`; larger values are shown as `PB` however big they are.
#[must_use]
pub fn readable_bytes(bytes: f64) -> String {
    let mut num = bytes;
    for unit in BYTE_UNITS {
        if num < 1024.0 {
            return format!("{num:.2} {unit}");
        }
        num /= 1024.0;
    }
    format!("{num:.2} PB")
}

/// Whole days between `now` and `expires_at`, rounded toward negative infinity.
#[must_use]
pub fn days_remaining(expires_at: i64, now: i64) -> i64 {
    (expires_at - now).div_euclid(SECONDS_PER_DAY)
}

/// Format epoch seconds in `tz`.
///
/// # Errors
///
/// Returns `AirportError::MalformedResponse` if `secs` is outside the representable range.
pub fn format_epoch<Tz>(
    tz: &Tz,
    secs: i64,
    fmt: &str,
    resource: Resource,
    field: &str,
) -> Result<String, AirportError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_opt(secs, 0)
        .earliest()
        .map(|dt| dt.format(fmt).to_string())
        .ok_or_else(|| {
            AirportError::malformed(resource.path(), format!("{field}: timestamp {secs} out of range"))
        })
}

/// Usage line: decimal GB for traffic, binary GB for the quota.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn usage_line(used_down: u64, used_up: u64, quota: u64) -> String {
    let down = used_down as f64 / DECIMAL_GB;
    let up = used_up as f64 / DECIMAL_GB;
    let total = (used_down as f64 + used_up as f64) / DECIMAL_GB;
    let quota = quota as f64 / BINARY_GB;
    format!("{total:.2}GB (↓{down:.2}, ↑{up:.2}) / {quota:.2}GB")
}

/// Build the summary view for `airport`.
///
/// # Errors
///
/// Returns `AirportError::MalformedResponse` if the expiry timestamp cannot be represented.
pub fn summary_view<Tz>(
    airport: &str,
    summary: &SubscriptionSummary,
    now: i64,
    tz: &Tz,
) -> Result<SummaryOutput, AirportError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (expiry, days_left) = match summary.expires_at {
        None => ("unlimited".to_owned(), None),
        Some(at) => {
            let when = format_epoch(tz, at, TIME_FORMAT, Resource::Subscribe, "expired_at")?;
            let days = days_remaining(at, now);
            (format!("{when} ({days} days left)"), Some(days))
        }
    };

    let speed_limit = summary
        .plan
        .speed_limit
        .as_ref()
        .map_or_else(|| "none".to_owned(), ToString::to_string);

    Ok(SummaryOutput {
        airport: airport.to_owned(),
        plan: summary.plan.name.clone(),
        expires_at: summary.expires_at,
        days_left,
        expiry,
        used_down: summary.used_down,
        used_up: summary.used_up,
        quota: summary.quota,
        usage: usage_line(summary.used_down, summary.used_up, summary.quota),
        speed_limit,
        subscribe_url: summary.subscribe_url.clone(),
        changes: Vec::new(),
        registry: None,
    })
}

/// Labelled text lines for the summary view.
#[must_use]
pub fn summary_lines(view: &SummaryOutput) -> Vec<String> {
    vec![
        format!("Plan: {}", view.plan),
        format!("Expires: {}", view.expiry),
        format!("Usage: {}", view.usage),
        format!("Speed limit: {}", view.speed_limit),
        format!("Subscribe URL: {}", view.subscribe_url),
    ]
}

/// Build server table rows. All entries are converted before any is returned.
///
/// # Errors
///
/// Returns `AirportError::MalformedResponse` if an update time cannot be represented.
pub fn server_rows<Tz>(servers: &[ServerEntry], tz: &Tz) -> Result<Vec<ServerOutput>, AirportError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    servers
        .iter()
        .enumerate()
        .map(|(i, server)| {
            let updated = format_epoch(
                tz,
                server.updated_at,
                MINUTE_FORMAT,
                Resource::Servers,
                &format!("data[{i}].updated_at"),
            )?;
            Ok(ServerOutput {
                name: server.name.clone(),
                online: server.is_online,
                status: if server.is_online { STATUS_ONLINE } else { STATUS_OFFLINE }.to_owned(),
                rate: server.rate.raw().to_owned(),
                kind: server.kind.clone(),
                updated_at: server.updated_at,
                updated,
                tags: server.tags.clone().unwrap_or_default(),
            })
        })
        .collect()
}

/// Build traffic log lines. All entries are converted before any is returned.
///
/// # Errors
///
/// Returns `AirportError::MalformedResponse` if a record time cannot be represented.
#[allow(clippy::cast_precision_loss)]
pub fn traffic_rows<Tz>(
    records: &[TrafficLogEntry],
    tz: &Tz,
) -> Result<Vec<TrafficLogOutput>, AirportError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let time = format_epoch(
                tz,
                record.record_at,
                TIME_FORMAT,
                Resource::TrafficLog,
                &format!("data[{i}].record_at"),
            )?;
            let total = (record.up as f64 + record.down as f64) * record.rate.factor();
            Ok(TrafficLogOutput {
                record_at: record.record_at,
                time,
                down: record.down,
                up: record.up,
                rate: record.rate.raw().to_owned(),
                total,
                down_readable: readable_bytes(record.down as f64),
                up_readable: readable_bytes(record.up as f64),
                total_readable: readable_bytes(total),
            })
        })
        .collect()
}

/// One text line of the traffic log.
#[must_use]
pub fn traffic_line(row: &TrafficLogOutput) -> String {
    format!(
        "time: {} | traffic: ↓{}, ↑{} | rate: {}x | total: {}",
        row.time, row.down_readable, row.up_readable, row.rate, row.total_readable
    )
}
