//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::error::AppError;
use std::env;

/// Default API origin; every request path is relative to it
pub const DEFAULT_API_BASE_URL: &str = "https://api.bentley.com";

/// Versioned media type sent in the `Accept` header
pub const DEFAULT_ACCEPT: &str = "application/vnd.bentley.itwin-platform.v1+json";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Demonstration workflow configuration
    pub workflow: WorkflowConfig,
}

/// Remote API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origin all relative paths are joined to
    pub base_url: String,
    /// Value of the `Accept` header
    pub accept: String,
    /// Per-request timeout (in seconds)
    pub timeout_secs: u64,
}

/// Demonstration workflow configuration
#[derive(Debug, Clone, Default)]
pub struct WorkflowConfig {
    /// Authorization header value ("Bearer ..."); prompted for when absent
    pub auth_header: Option<String>,
    /// Email invited by the membership workflow; defaults to the token's email claim
    pub member_email: Option<String>,
    /// Free-text term used by the search step of the lifecycle workflow
    pub search_term: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig {
                base_url: env::var("PROJECTS_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
                accept: env::var("PROJECTS_API_ACCEPT")
                    .unwrap_or_else(|_| DEFAULT_ACCEPT.to_string()),
                timeout_secs: env::var("PROJECTS_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30),
            },
            workflow: WorkflowConfig {
                auth_header: env::var("PROJECTS_AUTH_HEADER")
                    .ok()
                    .filter(|h| !h.trim().is_empty()),
                member_email: env::var("PROJECTS_MEMBER_EMAIL")
                    .ok()
                    .filter(|e| !e.trim().is_empty()),
                search_term: env::var("PROJECTS_SEARCH_TERM")
                    .unwrap_or_else(|_| "Sample Project".to_string()),
            },
        }
    }

    /// Check values that would otherwise fail on the first request
    pub fn validate(&self) -> Result<(), AppError> {
        self.api.validate()
    }
}

impl ApiConfig {
    /// Reject an empty or non-http(s) base URL and a zero timeout
    pub fn validate(&self) -> Result<(), AppError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(AppError::Config("base_url cannot be empty".to_string()));
        }
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(AppError::Config(format!(
                "base_url must start with http:// or https://, got {}",
                base
            )));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }
}
