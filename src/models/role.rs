//! Project role records

use crate::client::ContainerKey;
use serde::{Deserialize, Serialize};

/// `role` / `roles`
pub const ROLE_KEY: ContainerKey = ContainerKey::new("role", "roles");

/// Permissions granted to the administrator role by the membership workflow
pub const ADMINISTRATION_PERMISSIONS: [&str; 3] = [
    "administration_invite_member",
    "administration_manage_roles",
    "administration_remove_member",
];

/// A role defined on one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Server-assigned identifier (absent until created)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role name, also used when inviting members
    #[serde(default)]
    pub display_name: String,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Permission identifiers granted by the role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Role {
    /// The "Project Administrator" role with no permissions yet
    pub fn project_administrator() -> Self {
        Self {
            display_name: "Project Administrator".to_string(),
            description: Some("Project Administrator".to_string()),
            ..Default::default()
        }
    }

    /// Number of permissions the role carries
    pub fn permission_count(&self) -> usize {
        self.permissions.as_ref().map_or(0, Vec::len)
    }
}

/// Partial role body for PATCH
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdate {
    /// New role name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Full replacement permission list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl RoleUpdate {
    /// Update that replaces the role's permissions
    pub fn permissions<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: Some(permissions.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }
}
