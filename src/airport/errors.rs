/// Errors from the airport domain layer.
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while querying an airport or syncing the registry.
#[derive(Debug, Error)]
pub enum AirportError {
    /// The registry file does not exist.
    #[error("Registry file '{}' not found", .path.display())]
    ConfigNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The registry file exists but is not valid JSON or has the wrong shape.
    #[error("Registry file '{}' is malformed: {reason}", .path.display())]
    ConfigMalformed {
        /// Path of the offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The requested identity has no entry under `airports`.
    #[error("No airport named '{name}' in the registry")]
    UnknownAirport {
        /// The identity that was asked for.
        name: String,
    },

    /// The HTTP request failed: either a non-success status or a transport error.
    #[error("Request to '{host}' failed: {cause}")]
    RemoteRequest {
        /// Airport host.
        host: String,
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// `HTTP <status>` or the transport error text.
        cause: String,
    },

    /// The response body is not JSON or does not match the expected schema.
    #[error("Malformed response from {resource}: {detail}")]
    MalformedResponse {
        /// Resource path the payload came from.
        resource: String,
        /// The offending field or shape.
        detail: String,
    },

    /// Writing the registry file failed.
    #[error("Failed to write registry file '{}': {source}", .path.display())]
    Persistence {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl AirportError {
    /// Machine-readable error code (snake_case) for the JSON error envelope.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "config_not_found",
            Self::ConfigMalformed { .. } => "config_malformed",
            Self::UnknownAirport { .. } => "unknown_airport",
            Self::RemoteRequest { .. } => "remote_request",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Persistence { .. } => "persistence",
        }
    }

    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigNotFound { .. }
            | Self::ConfigMalformed { .. }
            | Self::UnknownAirport { .. } => 2,
            Self::RemoteRequest { .. } => 3,
            Self::MalformedResponse { .. } => 4,
            Self::Persistence { .. } => 5,
        }
    }

    pub(crate) fn malformed(resource: &str, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            resource: resource.to_owned(),
            detail: detail.into(),
        }
    }
}
