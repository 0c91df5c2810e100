//! Project session
//!
//! Resource-shaped operations over the endpoint client. Each operation knows
//! the single status it expects and raises `AppError::Api` for anything else.
//! Every project created through a session is tracked and deleted by
//! [`ProjectSession::close`]; a session dropped without closing leaks those
//! projects on the server.

use crate::client::{ApiResponse, EndpointClient, ExtraHeaders};
use crate::config::ApiConfig;
use crate::credential::BearerCredential;
use crate::error::AppError;
use crate::models::{
    Member, MemberInvitation, Project, ProjectQuery, ProjectUpdate, Role, RoleUpdate, MEMBER_KEY,
    PROJECT_KEY, ROLE_KEY,
};
use reqwest::StatusCode;

/// Header asking the server for the full resource representation
const PREFER_HEADER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Outcome of draining a session's tracked projects
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Projects deleted by this cleanup
    pub deleted: Vec<String>,
    /// Projects the server no longer knew about (404)
    pub already_gone: Vec<String>,
    /// Projects whose deletion failed, with the error
    pub failed: Vec<(String, AppError)>,
}

impl CleanupReport {
    /// True when no deletion failed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of tracked projects the cleanup attempted
    pub fn attempted(&self) -> usize {
        self.deleted.len() + self.already_gone.len() + self.failed.len()
    }
}

/// One scripted run against the project API
#[derive(Debug)]
pub struct ProjectSession {
    client: EndpointClient,
    tracked: Vec<Project>,
}

impl ProjectSession {
    /// Open a session for the configured API and credential
    pub fn open(api: &ApiConfig, credential: &BearerCredential) -> Result<Self, AppError> {
        let client = EndpointClient::new(api, credential)?;
        tracing::info!(base_url = %client.base_url(), "Opened project session");
        Ok(Self::with_client(client))
    }

    /// Open a session over an already configured client
    pub fn with_client(client: EndpointClient) -> Self {
        Self {
            client,
            tracked: Vec::new(),
        }
    }

    /// Projects created so far, in creation order
    pub fn tracked_projects(&self) -> &[Project] {
        &self.tracked
    }

    /// Endpoint client used by the session
    pub fn client(&self) -> &EndpointClient {
        &self.client
    }

    /// Create a project (a fresh sample when `project` is `None`) and track it
    pub async fn create_project(&mut self, project: Option<Project>) -> Result<Project, AppError> {
        let project = project.unwrap_or_else(Project::sample);
        tracing::info!(display_name = %project.display_name, "Creating project");

        let response = self
            .client
            .post::<_, Project>("/projects", PROJECT_KEY, &project, None)
            .await?;
        let created = require_payload(expect_status(response, StatusCode::CREATED)?, "project")?;

        match created.id.as_deref() {
            Some(id) if !id.is_empty() => {
                tracing::info!(project_id = %id, "Project created");
                self.tracked.push(created.clone());
            }
            _ => tracing::warn!(
                display_name = %created.display_name,
                "Created project has no identifier and cannot be cleaned up"
            ),
        }
        Ok(created)
    }

    /// Fetch one project by id
    pub async fn get_project(&self, id: &str) -> Result<Project, AppError> {
        tracing::info!(project_id = %id, "Getting project");
        let response = self
            .client
            .get_single::<Project>(&format!("/projects/{}", id), PROJECT_KEY, Some(&representation()))
            .await?;
        let project = require_payload(expect_status(response, StatusCode::OK)?, "project")?;
        tracing::info!(project_id = %id, "Project retrieved");
        Ok(project)
    }

    /// List accessible projects, optionally filtered
    ///
    /// Only the server's default page is returned.
    pub async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, AppError> {
        tracing::info!(query = ?query, "Listing projects");
        let path = format!("/projects{}", query.query_string());
        self.list(&path, "projects").await
    }

    /// List the caller's favorite projects
    pub async fn list_favorite_projects(&self) -> Result<Vec<Project>, AppError> {
        tracing::info!("Listing favorite projects");
        self.list("/projects/favorites", "favorite projects").await
    }

    /// List the caller's recently used projects
    pub async fn list_recent_projects(&self) -> Result<Vec<Project>, AppError> {
        tracing::info!("Listing recent projects");
        self.list("/projects/recents", "recent projects").await
    }

    /// Apply a partial update and return the server's updated project
    pub async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<Project, AppError> {
        tracing::info!(project_id = %id, "Updating project");
        let response = self
            .client
            .patch::<_, Project>(&format!("/projects/{}", id), PROJECT_KEY, update, None)
            .await?;
        let project = require_payload(expect_status(response, StatusCode::OK)?, "project")?;
        tracing::info!(project_id = %id, display_name = %project.display_name, "Project updated");
        Ok(project)
    }

    /// Delete a project
    ///
    /// The project stays tracked; cleanup treats a later 404 as already deleted.
    pub async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        tracing::info!(project_id = %id, "Deleting project");
        let response = self
            .client
            .delete(&format!("/projects/{}", id), None)
            .await?;
        expect_status(response, StatusCode::NO_CONTENT)?;
        tracing::info!(project_id = %id, "Project deleted");
        Ok(())
    }

    /// Add a project to the caller's recents
    ///
    /// The server keeps a bounded list and evicts the oldest entry.
    pub async fn add_project_to_recents(&self, id: &str) -> Result<(), AppError> {
        tracing::info!(project_id = %id, "Adding project to recents");
        let response = self
            .client
            .post_empty::<Project>(&format!("/projects/recents/{}", id), None)
            .await?;
        expect_status(response, StatusCode::OK)?;
        Ok(())
    }

    /// Add a project to the caller's favorites
    pub async fn add_project_to_favorites(&self, id: &str) -> Result<(), AppError> {
        tracing::info!(project_id = %id, "Adding project to favorites");
        let response = self
            .client
            .post_empty::<Project>(&format!("/projects/favorites/{}", id), None)
            .await?;
        expect_status(response, StatusCode::OK)?;
        Ok(())
    }

    /// List roles defined on a project
    pub async fn get_project_roles(&self, project_id: &str) -> Result<Vec<Role>, AppError> {
        tracing::info!(project_id = %project_id, "Listing project roles");
        let response = self
            .client
            .get_list::<Role>(&format!("/projects/{}/roles", project_id), ROLE_KEY, None)
            .await?;
        let roles = expect_status(response, StatusCode::OK)?
            .into_payload()
            .unwrap_or_default();
        tracing::info!(project_id = %project_id, count = roles.len(), "Retrieved project roles");
        Ok(roles)
    }

    /// Create a role (the administrator role when `role` is `None`)
    pub async fn create_project_role(
        &self,
        project_id: &str,
        role: Option<Role>,
    ) -> Result<Role, AppError> {
        let role = role.unwrap_or_else(Role::project_administrator);
        tracing::info!(project_id = %project_id, role = %role.display_name, "Creating project role");
        let response = self
            .client
            .post::<_, Role>(&format!("/projects/{}/roles", project_id), ROLE_KEY, &role, None)
            .await?;
        let created = require_payload(expect_status(response, StatusCode::CREATED)?, "role")?;
        tracing::info!(project_id = %project_id, role_id = ?created.id, "Project role created");
        Ok(created)
    }

    /// Apply a partial update to a role
    pub async fn update_project_role(
        &self,
        project_id: &str,
        role_id: &str,
        update: &RoleUpdate,
    ) -> Result<Role, AppError> {
        tracing::info!(project_id = %project_id, role_id = %role_id, "Updating project role");
        let response = self
            .client
            .patch::<_, Role>(
                &format!("/projects/{}/roles/{}", project_id, role_id),
                ROLE_KEY,
                update,
                None,
            )
            .await?;
        let role = require_payload(expect_status(response, StatusCode::OK)?, "role")?;
        tracing::info!(
            role_id = %role_id,
            permissions = role.permission_count(),
            "Project role updated"
        );
        Ok(role)
    }

    /// List members of a project
    pub async fn get_project_members(&self, project_id: &str) -> Result<Vec<Member>, AppError> {
        tracing::info!(project_id = %project_id, "Listing project members");
        let response = self
            .client
            .get_list::<Member>(&format!("/projects/{}/members", project_id), MEMBER_KEY, None)
            .await?;
        let members = expect_status(response, StatusCode::OK)?
            .into_payload()
            .unwrap_or_default();
        tracing::info!(project_id = %project_id, count = members.len(), "Retrieved project members");
        Ok(members)
    }

    /// Invite a user to a project
    ///
    /// Returns the member the server created, or `None` if it only acknowledged.
    pub async fn add_project_member(
        &self,
        project_id: &str,
        invitation: &MemberInvitation,
    ) -> Result<Option<Member>, AppError> {
        tracing::info!(project_id = %project_id, email = %invitation.email, "Adding project member");
        let response = self
            .client
            .post::<_, Member>(
                &format!("/projects/{}/members", project_id),
                MEMBER_KEY,
                invitation,
                None,
            )
            .await?;
        let member = expect_status(response, StatusCode::CREATED)?.into_payload();
        tracing::info!(project_id = %project_id, "Project member added");
        Ok(member)
    }

    /// Delete every tracked project, in creation order
    ///
    /// Every entry is attempted once even when earlier deletions fail. This
    /// must be called at the end of a run; dropping the session instead leaves
    /// the projects on the server.
    pub async fn close(mut self) -> CleanupReport {
        let tracked = std::mem::take(&mut self.tracked);
        tracing::info!(count = tracked.len(), "Deleting projects created in this session");

        let mut report = CleanupReport::default();
        for project in tracked {
            let id = project.id_str().to_string();
            match self.delete_project(&id).await {
                Ok(()) => report.deleted.push(id),
                Err(AppError::Api {
                    status: StatusCode::NOT_FOUND,
                    ..
                }) => {
                    tracing::info!(project_id = %id, "Project was already deleted");
                    report.already_gone.push(id);
                }
                Err(e) => {
                    tracing::error!(project_id = %id, error = %e, "Failed to delete project");
                    report.failed.push((id, e));
                }
            }
        }

        tracing::info!(
            deleted = report.deleted.len(),
            already_gone = report.already_gone.len(),
            failed = report.failed.len(),
            "Session cleanup finished"
        );
        report
    }

    async fn list(&self, path: &str, what: &str) -> Result<Vec<Project>, AppError> {
        let response = self
            .client
            .get_list::<Project>(path, PROJECT_KEY, Some(&representation()))
            .await?;
        let projects = expect_status(response, StatusCode::OK)?
            .into_payload()
            .unwrap_or_default();
        tracing::info!(count = projects.len(), "Retrieved {}", what);
        Ok(projects)
    }
}

impl Drop for ProjectSession {
    fn drop(&mut self) {
        if !self.tracked.is_empty() {
            let ids: Vec<&str> = self.tracked.iter().map(Project::id_str).collect();
            tracing::warn!(
                leaked = ?ids,
                "Project session dropped without close(); created projects were not deleted"
            );
        }
    }
}

fn representation() -> ExtraHeaders {
    ExtraHeaders::from([(PREFER_HEADER.to_string(), RETURN_REPRESENTATION.to_string())])
}

/// Raise `AppError::Api` unless the response carries the expected status
pub fn expect_status<P>(
    response: ApiResponse<P>,
    expected: StatusCode,
) -> Result<ApiResponse<P>, AppError> {
    if response.status == expected {
        return Ok(response);
    }
    Err(AppError::Api {
        status: response.status,
        detail: response.error_details().cloned(),
    })
}

fn require_payload<P>(response: ApiResponse<P>, what: &str) -> Result<P, AppError> {
    let status = response.status;
    response
        .into_payload()
        .ok_or_else(|| AppError::MalformedResponse {
            status,
            reason: format!("success response carried no {}", what),
        })
}
