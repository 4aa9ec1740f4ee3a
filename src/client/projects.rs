//! Project operations.

use tracing::debug;

use super::models::{CreateProjectRequest, EnvVars, Project, UpdateProjectRequest};
use super::{encode, Client, Method};
use crate::error::Result;

pub(super) fn project_path(project_id: &str) -> String {
    format!("/api/projects/{}", project_id)
}

impl Client {
    /// List the projects owned by the current user.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.request(Method::GET, "/api/projects", &[], None).await
    }

    /// Create a project with the given name and initial environment variables.
    pub async fn create_project(&self, name: &str, env_vars: EnvVars) -> Result<Project> {
        let body = encode(&CreateProjectRequest {
            name: name.to_string(),
            env_vars,
        })?;
        self.request(Method::POST, "/api/projects", &[], Some(body))
            .await
    }

    /// Get a project by ID.
    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        let project: Project = self
            .request(Method::GET, &project_path(project_id), &[], None)
            .await?;
        debug!(
            project_id,
            has_production_deployment = project.has_production_deployment,
            linked = project.git.is_some(),
            "Fetched project"
        );
        Ok(project)
    }

    /// Rename a project. This is the only attribute the endpoint updates.
    pub async fn update_project(&self, project_id: &str, new_name: &str) -> Result<()> {
        let body = encode(&UpdateProjectRequest {
            name: new_name.to_string(),
        })?;
        self.request_unit(Method::PATCH, &project_path(project_id), Some(body))
            .await
    }

    /// Delete a project and all of its deployments.
    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.request_unit(Method::DELETE, &project_path(project_id), None)
            .await
    }

    /// Replace the environment variables of a project.
    ///
    /// Variables absent from `env_vars` are removed.
    pub async fn update_env_vars(&self, project_id: &str, env_vars: &EnvVars) -> Result<()> {
        let path = format!("{}/env", project_path(project_id));
        self.request_unit(Method::POST, &path, Some(encode(env_vars)?))
            .await
    }
}
