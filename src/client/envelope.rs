//! Response envelope types
//!
//! Structs that mirror the project API's JSON envelope conventions and the
//! normalized outcome every endpoint call produces.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Error object carried under the `error` key of a non-success body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// API-defined error code (e.g. "ProjectNotFound")
    #[serde(default)]
    pub code: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

/// JSON property names a resource is nested under in response bodies
///
/// A single resource lives under `singular`, a list under `plural`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerKey {
    /// Key for one instance (e.g. "project")
    pub singular: &'static str,
    /// Key for a list of instances (e.g. "projects")
    pub plural: &'static str,
}

impl ContainerKey {
    /// Build a descriptor from explicit singular and plural keys
    pub const fn new(singular: &'static str, plural: &'static str) -> Self {
        Self { singular, plural }
    }
}

/// What a call produced besides its status
///
/// Exactly one of payload, error detail, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<P> {
    /// Decoded resource(s) from a success response
    Payload(P),
    /// Error object decoded from a non-success response
    Error(ErrorDetails),
    /// No body, or a non-success body without an `error` object
    Empty,
}

/// Normalized result of one HTTP call
#[derive(Debug, Clone)]
pub struct ApiResponse<P> {
    /// Status the server answered with
    pub status: StatusCode,
    /// Raw body text (empty when the server sent none)
    pub content: String,
    /// Payload or error detail, never both
    pub outcome: Outcome<P>,
}

impl<P> ApiResponse<P> {
    pub(crate) fn new(status: StatusCode, content: String, outcome: Outcome<P>) -> Self {
        Self {
            status,
            content,
            outcome,
        }
    }

    /// Decoded payload, if the call succeeded with a body
    pub fn payload(&self) -> Option<&P> {
        match &self.outcome {
            Outcome::Payload(p) => Some(p),
            _ => None,
        }
    }

    /// Take ownership of the decoded payload
    pub fn into_payload(self) -> Option<P> {
        match self.outcome {
            Outcome::Payload(p) => Some(p),
            _ => None,
        }
    }

    /// Decoded error object, if the server sent one
    pub fn error_details(&self) -> Option<&ErrorDetails> {
        match &self.outcome {
            Outcome::Error(e) => Some(e),
            _ => None,
        }
    }

    /// True when the server throttled the call (429)
    ///
    /// No retry happens inside the client unless a `RetryPolicy` asks for one.
    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// Response for list calls
pub type ListResponse<T> = ApiResponse<Vec<T>>;

/// Response for single-resource GET, POST, and PATCH calls
pub type SingleResponse<T> = ApiResponse<T>;

/// Response for DELETE calls, which never carry a payload
pub type DeleteResponse = ApiResponse<()>;
