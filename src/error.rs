//! Error types and error handling for the client
//!
//! The endpoint layer only raises for transport, encoding, and malformed
//! success bodies. Status mismatches are turned into `AppError::Api` by the
//! workflow layer, which knows the expected status of each operation.

use crate::client::ErrorDetails;
use reqwest::StatusCode;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Network or TLS failure reported by the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request body could not be serialized to JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A caller-supplied header name or value is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The server reported success but the body did not have the expected shape
    #[error("Malformed response ({status}): {reason}")]
    MalformedResponse {
        /// Status the server answered with
        status: StatusCode,
        /// What could not be decoded
        reason: String,
    },

    /// The server answered with a status other than the one the operation expects
    #[error("{}", format_api_error(.status, .detail.as_ref()))]
    Api {
        /// Status the server answered with
        status: StatusCode,
        /// Error object decoded from the body, if there was one
        detail: Option<ErrorDetails>,
    },

    /// Authorization header could not be parsed
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Configuration value is missing or out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Internal error (catch-all for unexpected errors)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status code carried by the error, if it came from a server response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::Api { status, .. } | AppError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            AppError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

fn format_api_error(status: &StatusCode, detail: Option<&ErrorDetails>) -> String {
    match detail {
        Some(detail) => format!("{}: {} - {}", status, detail.code, detail.message),
        None => format!("{}: no detail", status),
    }
}
