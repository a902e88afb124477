/// Shared serializable output types for all commands.
///
/// These types are what gets written to stdout — either as JSON or rendered
/// as text and tables. They are decoupled from the API payload types in
/// `airport::payload`.
use serde::{Deserialize, Serialize};

/// Rendered subscription summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    /// Queried identity.
    pub airport: String,
    /// Plan name.
    pub plan: String,
    /// Expiry as epoch seconds, or null for unlimited plans.
    pub expires_at: Option<i64>,
    /// Whole days until expiry (negative once expired), or null for unlimited plans.
    pub days_left: Option<i64>,
    /// Human-readable expiry line.
    pub expiry: String,
    /// Downloaded bytes.
    pub used_down: u64,
    /// Uploaded bytes.
    pub used_up: u64,
    /// Quota in bytes.
    pub quota: u64,
    /// Human-readable usage line, e.g. `3.00GB (↓2.00, ↑1.00) / 10.00GB`.
    pub usage: String,
    /// Speed limit, or `none`.
    pub speed_limit: String,
    /// Current subscribe URL (may be empty).
    pub subscribe_url: String,
    /// Registry entries updated to the current URL.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<UrlChangeOutput>,
    /// What happened to the registry file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryStatus>,
}

/// One registry URL update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlChangeOutput {
    /// Position of the entry in `subscribes`.
    pub index: usize,
    pub old: String,
    pub new: String,
}

/// Outcome of the registry write after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryStatus {
    /// Nothing differed; the file was not touched.
    Unchanged,
    /// Changes were written.
    Saved,
    /// Changes were computed but `--dry-run` suppressed the write.
    DryRun,
    /// Changes were computed but the write failed.
    Failed,
}

/// One row of the server table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerOutput {
    pub name: String,
    pub online: bool,
    /// Status glyph and label, e.g. `🟢 online`.
    pub status: String,
    /// Rate multiplier as sent by the server.
    pub rate: String,
    /// Protocol type (`vmess`, `trojan`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Epoch seconds.
    pub updated_at: i64,
    /// Update time at minute precision.
    pub updated: String,
    pub tags: Vec<String>,
}

/// One traffic log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficLogOutput {
    /// Epoch seconds.
    pub record_at: i64,
    /// Record time at second precision.
    pub time: String,
    pub down: u64,
    pub up: u64,
    /// Rate multiplier as sent by the server.
    pub rate: String,
    /// `(up + down) * rate` in bytes.
    pub total: f64,
    pub down_readable: String,
    pub up_readable: String,
    pub total_readable: String,
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (snake_case).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status for remote request failures that got an answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl ErrorOutput {
    /// Construct from an `AirportError`.
    #[must_use]
    pub fn from_airport_error(err: &crate::airport::AirportError) -> Self {
        use crate::airport::AirportError;
        let http_status = match err {
            AirportError::RemoteRequest { status, .. } => *status,
            _ => None,
        };
        Self {
            ok: false,
            error: ErrorDetail {
                code: err.code().to_owned(),
                message: err.to_string(),
                http_status,
            },
        }
    }
}
