//! Project records
//!
//! Snapshots of the server's project resource and the partial body used to
//! update one.

use crate::client::ContainerKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `project` / `projects`
pub const PROJECT_KEY: ContainerKey = ContainerKey::new("project", "projects");

/// A project as created by the client or returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Server-assigned identifier (absent until created)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name shown in the portal
    #[serde(default)]
    pub display_name: String,
    /// Unique project number
    #[serde(default)]
    pub project_number: String,
    /// When the project was registered (server-assigned)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date_time: Option<DateTime<Utc>>,
    /// Free-text location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_location: Option<String>,
    /// Latitude in decimal degrees, as a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    /// Longitude in decimal degrees, as a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    /// Time zone abbreviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    /// Data center hosting the project (server-assigned)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_center_location: Option<String>,
    /// ISO country code used for billing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_country: Option<String>,
    /// Lifecycle status (e.g. "Active")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Whether members outside the owning organization may join
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_external_team_members: Option<bool>,
}

impl Project {
    /// A fresh project with unique name and number
    pub fn sample() -> Self {
        Self {
            display_name: format!("Sample Project Name {}", Uuid::new_v4()),
            project_number: format!("Sample Project Number {}", Uuid::new_v4()),
            geographic_location: Some("Vilnius, Lithuania".to_string()),
            latitude: Some("54.687157".to_string()),
            longitude: Some("25.279652".to_string()),
            time_zone: Some("EEST".to_string()),
            billing_country: Some("LT".to_string()),
            allow_external_team_members: Some(true),
            ..Default::default()
        }
    }

    /// Identifier, or an empty string when the server has not assigned one
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

/// Partial project body for PATCH; only set fields are sent
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New project number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_number: Option<String>,
    /// New location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_location: Option<String>,
    /// New latitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    /// New longitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    /// New time zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// New external membership setting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_external_team_members: Option<bool>,
}

impl ProjectUpdate {
    /// Update that only renames the project
    pub fn rename(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..Default::default()
        }
    }
}

/// Filter for listing projects
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProjectQuery {
    /// Every project the caller can access (server's default page)
    #[default]
    All,
    /// Exact match on project number
    ByNumber(String),
    /// Free-text search over project number and display name
    Search(String),
}

impl ProjectQuery {
    /// Query string (including the leading `?`), or empty for `All`
    pub fn query_string(&self) -> String {
        match self {
            ProjectQuery::All => String::new(),
            ProjectQuery::ByNumber(number) if !number.trim().is_empty() => {
                format!("?projectNumber={}", urlencoding::encode(number))
            }
            ProjectQuery::Search(term) if !term.trim().is_empty() => {
                format!("?$search={}", urlencoding::encode(term))
            }
            _ => String::new(),
        }
    }
}
