//! Project member records

use crate::client::ContainerKey;
use serde::{Deserialize, Serialize};

/// `member` / `members`
pub const MEMBER_KEY: ContainerKey = ContainerKey::new("member", "members");

/// A user who belongs to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// User email
    #[serde(default)]
    pub email: String,
    /// Names of the roles the user holds on the project
    #[serde(default, alias = "roleNames")]
    pub roles: Vec<String>,
}

/// Body for inviting a user to a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInvitation {
    /// Email of the user to invite
    pub email: String,
    /// Names of the roles to grant
    pub role_names: Vec<String>,
}

impl MemberInvitation {
    /// Invite `email` with a single role
    pub fn with_role(email: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role_names: vec![role_name.into()],
        }
    }
}
