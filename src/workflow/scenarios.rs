//! Demonstration workflows
//!
//! Fixed sequences of session operations. Neither workflow deletes what it
//! creates; the caller closes the session afterwards.

use crate::error::AppError;
use crate::models::{
    MemberInvitation, ProjectQuery, ProjectUpdate, RoleUpdate, ADMINISTRATION_PERMISSIONS,
};
use crate::workflow::session::ProjectSession;
use anyhow::anyhow;

/// Counts observed by the project lifecycle workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSummary {
    /// Project created by the workflow
    pub project_id: String,
    /// Projects returned by the unfiltered listing
    pub all_projects: usize,
    /// Projects matching the created project's number
    pub matching_number: usize,
    /// Projects returned by the free-text search
    pub search_results: usize,
    /// Display name after the rename
    pub renamed_to: String,
    /// Favorites after adding the project
    pub favorites: usize,
    /// Recents after adding the project
    pub recents: usize,
}

/// Counts observed by the project membership workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSummary {
    /// Project created by the workflow
    pub project_id: String,
    /// Role created and granted permissions
    pub role_id: String,
    /// Permissions on the role after the update
    pub role_permissions: usize,
    /// Roles defined on the project
    pub roles: usize,
    /// Members of the project after the invitation
    pub members: usize,
}

/// Create, read, search, rename, and bookmark a project
pub async fn project_lifecycle_workflow(
    session: &mut ProjectSession,
    search_term: &str,
) -> Result<LifecycleSummary, AppError> {
    let created = session.create_project(None).await?;
    let project_id = created
        .id
        .clone()
        .ok_or_else(|| AppError::Internal(anyhow!("created project has no id")))?;

    let fetched = session.get_project(&project_id).await?;
    tracing::debug!(project_id = %fetched.id_str(), "Fetched created project");

    let all = session.list_projects(&ProjectQuery::All).await?;
    let by_number = session
        .list_projects(&ProjectQuery::ByNumber(created.project_number.clone()))
        .await?;
    let search = session
        .list_projects(&ProjectQuery::Search(search_term.to_string()))
        .await?;

    let renamed = session
        .update_project(
            &project_id,
            &ProjectUpdate::rename(format!("{} Updated", created.display_name)),
        )
        .await?;

    session.add_project_to_recents(&project_id).await?;
    session.add_project_to_favorites(&project_id).await?;

    let favorites = session.list_favorite_projects().await?;
    let recents = session.list_recent_projects().await?;

    Ok(LifecycleSummary {
        project_id,
        all_projects: all.len(),
        matching_number: by_number.len(),
        search_results: search.len(),
        renamed_to: renamed.display_name,
        favorites: favorites.len(),
        recents: recents.len(),
    })
}

/// Create a project with an administrator role and invite a member under it
pub async fn project_membership_workflow(
    session: &mut ProjectSession,
    member_email: &str,
) -> Result<MembershipSummary, AppError> {
    let project = session.create_project(None).await?;
    let project_id = project
        .id
        .clone()
        .ok_or_else(|| AppError::Internal(anyhow!("created project has no id")))?;

    let role = session.create_project_role(&project_id, None).await?;
    let role_id = role
        .id
        .clone()
        .ok_or_else(|| AppError::Internal(anyhow!("created role has no id")))?;

    let role = session
        .update_project_role(
            &project_id,
            &role_id,
            &RoleUpdate::permissions(ADMINISTRATION_PERMISSIONS),
        )
        .await?;

    let roles = session.get_project_roles(&project_id).await?;

    session
        .add_project_member(
            &project_id,
            &MemberInvitation::with_role(member_email, role.display_name.clone()),
        )
        .await?;

    let members = session.get_project_members(&project_id).await?;

    Ok(MembershipSummary {
        project_id,
        role_id,
        role_permissions: role.permission_count(),
        roles: roles.len(),
        members: members.len(),
    })
}
