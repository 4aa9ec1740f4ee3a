//! GitHub integration.

use super::models::{LinkProjectRequest, Project};
use super::projects::project_path;
use super::{encode, Client, Method};
use crate::error::Result;

impl Client {
    /// Link a project to a GitHub repository.
    pub async fn link_github(&self, link: &LinkProjectRequest) -> Result<Project> {
        let body = encode(link)?;
        self.request(Method::POST, "/api/github/link", &[], Some(body))
            .await
    }

    /// Remove the GitHub integration of a project.
    ///
    /// Only future deployments are affected.
    pub async fn unlink_github(&self, project_id: &str) -> Result<()> {
        let path = format!("{}/git", project_path(project_id));
        self.request_unit(Method::DELETE, &path, None).await
    }
}
