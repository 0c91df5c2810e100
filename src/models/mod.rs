//! Resource records
//!
//! Passive data shapes for projects, roles, and members, plus the container
//! keys their envelopes use.

pub mod member;
pub mod project;
pub mod role;

pub use member::{Member, MemberInvitation, MEMBER_KEY};
pub use project::{Project, ProjectQuery, ProjectUpdate, PROJECT_KEY};
pub use role::{Role, RoleUpdate, ADMINISTRATION_PERMISSIONS, ROLE_KEY};
