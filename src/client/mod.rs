//! Project API client module
//!
//! Transport and response mapping for the project administration API:
//! request construction, header handling, body serialization, and the
//! normalization of JSON envelopes into typed `ApiResponse` values.

pub mod endpoint;
pub mod envelope;
pub mod retry;

pub use endpoint::{EndpointClient, ExtraHeaders};
pub use envelope::{
    ApiResponse, ContainerKey, DeleteResponse, ErrorDetails, ListResponse, Outcome,
    SingleResponse,
};
pub use retry::{NoRetry, RetryPolicy};
