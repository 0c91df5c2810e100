//! Project Administration Client Library
//!
//! This library exposes modules for testing and external use.
//! The demonstration binary is in `src/main.rs`.

pub mod client;
pub mod config;
/// Bearer credential parsing and claim extraction
pub mod credential;
pub mod error;
pub mod models;
pub mod workflow;
