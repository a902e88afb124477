/// Typed schemas for the three airport API resources.
///
/// Every resource answers with an envelope `{"data": ...}`. The envelope is
/// unwrapped first, then the payload is decoded against an explicit schema.
/// List payloads are decoded entry by entry so a failure names the index of
/// the offending record; nothing is rendered until every entry has decoded.
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::AirportError;

/// The remote resources this tool reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Plan, usage and subscribe URL.
    Subscribe,
    /// Server listing.
    Servers,
    /// Per-day traffic records.
    TrafficLog,
}

impl Resource {
    /// Path under `/api/v1/user/`.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Subscribe => "getSubscribe",
            Self::Servers => "server/fetch",
            Self::TrafficLog => "stat/getTrafficLog",
        }
    }
}

/// A traffic rate multiplier.
///
/// The API sends it either as a number (`1.5`) or as a numeric string
/// (`"2"`). The raw text is kept for display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRate")]
pub struct Rate {
    raw: String,
    factor: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRate {
    Number(serde_json::Number),
    Text(String),
}

impl TryFrom<RawRate> for Rate {
    type Error = String;

    fn try_from(raw: RawRate) -> Result<Self, Self::Error> {
        match raw {
            RawRate::Number(n) => {
                let factor = n
                    .as_f64()
                    .ok_or_else(|| format!("rate {n} is out of range"))?;
                Ok(Self {
                    raw: n.to_string(),
                    factor,
                })
            }
            RawRate::Text(s) => {
                let factor = s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("rate '{s}' is not a number"))?;
                Ok(Self { raw: s, factor })
            }
        }
    }
}

impl Rate {
    /// The multiplier as sent by the server.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The multiplier as a number.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

/// Plan details nested in the subscription summary.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub name: String,
    /// Speed cap; `None` means unlimited.
    #[serde(default)]
    pub speed_limit: Option<serde_json::Number>,
}

/// `getSubscribe` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionSummary {
    pub plan: Plan,
    /// Expiry as epoch seconds; `None` means the plan never expires.
    #[serde(rename = "expired_at", default)]
    pub expires_at: Option<i64>,
    /// Downloaded bytes.
    #[serde(rename = "d")]
    pub used_down: u64,
    /// Uploaded bytes.
    #[serde(rename = "u")]
    pub used_up: u64,
    /// Traffic quota in bytes.
    #[serde(rename = "transfer_enable")]
    pub quota: u64,
    /// Current subscribe URL; may be empty.
    pub subscribe_url: String,
}

/// One `server/fetch` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    pub is_online: bool,
    pub rate: Rate,
    #[serde(rename = "type")]
    pub kind: String,
    /// Last update, epoch seconds.
    pub updated_at: i64,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// One `stat/getTrafficLog` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TrafficLogEntry {
    /// Epoch seconds.
    pub record_at: i64,
    #[serde(rename = "d")]
    pub down: u64,
    #[serde(rename = "u")]
    pub up: u64,
    #[serde(rename = "server_rate")]
    pub rate: Rate,
}

/// Decode a `getSubscribe` envelope.
///
/// # Errors
///
/// Returns `AirportError::MalformedResponse` naming the missing or mistyped field.
pub fn decode_summary(body: Value) -> Result<SubscriptionSummary, AirportError> {
    let resource = Resource::Subscribe.path();
    let data = envelope_data(resource, body)?;
    if !data.is_object() {
        return Err(AirportError::malformed(resource, "data: expected an object"));
    }
    serde_json::from_value(data).map_err(|e| AirportError::malformed(resource, format!("data: {e}")))
}

/// Decode a `server/fetch` envelope.
///
/// # Errors
///
/// Returns `AirportError::MalformedResponse` for the first entry that fails to decode.
pub fn decode_servers(body: Value) -> Result<Vec<ServerEntry>, AirportError> {
    decode_list(Resource::Servers.path(), body)
}

/// Decode a `stat/getTrafficLog` envelope.
///
/// # Errors
///
/// Returns `AirportError::MalformedResponse` for the first entry that fails to decode.
pub fn decode_traffic_log(body: Value) -> Result<Vec<TrafficLogEntry>, AirportError> {
    decode_list(Resource::TrafficLog.path(), body)
}

fn decode_list<T: DeserializeOwned>(resource: &str, body: Value) -> Result<Vec<T>, AirportError> {
    let Value::Array(entries) = envelope_data(resource, body)? else {
        return Err(AirportError::malformed(resource, "data: expected an array"));
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            serde_json::from_value(entry)
                .map_err(|e| AirportError::malformed(resource, format!("data[{i}]: {e}")))
        })
        .collect()
}

fn envelope_data(resource: &str, body: Value) -> Result<Value, AirportError> {
    let Value::Object(mut envelope) = body else {
        return Err(AirportError::malformed(resource, "expected a JSON object envelope"));
    };
    envelope
        .remove("data")
        .ok_or_else(|| AirportError::malformed(resource, "missing field `data`"))
}
