//! Workflow module
//!
//! Resource operations built on the endpoint client, the session that tracks
//! and cleans up created projects, and the scripted demonstration workflows.

pub mod scenarios;
pub mod session;

pub use scenarios::{
    project_lifecycle_workflow, project_membership_workflow, LifecycleSummary, MembershipSummary,
};
pub use session::{expect_status, CleanupReport, ProjectSession};
