//! Deployment operations.

use super::models::{Deployment, DeploymentPage, NewDeploymentRequest, PageOptions};
use super::projects::project_path;
use super::{encode, Client, Method};
use crate::error::{ProviderError, Result};

fn deployments_path(project_id: &str) -> String {
    format!("{}/deployments", project_path(project_id))
}

impl Client {
    /// Create a deployment of a project from a publicly reachable source URL.
    ///
    /// Projects linked to GitHub get new deployments on push and do not need this.
    pub async fn create_deployment(
        &self,
        project_id: &str,
        deployment: &NewDeploymentRequest,
    ) -> Result<Deployment> {
        let body = encode(deployment)?;
        self.request(
            Method::POST,
            &deployments_path(project_id),
            &[],
            Some(body),
        )
        .await
    }

    /// List one page of a project's deployments.
    pub async fn list_deployments(
        &self,
        project_id: &str,
        page: PageOptions,
    ) -> Result<DeploymentPage> {
        self.request(
            Method::GET,
            &deployments_path(project_id),
            &page.to_query(),
            None,
        )
        .await
    }

    /// Get a single deployment, including its owning project.
    pub async fn get_deployment(&self, project_id: &str, deployment_id: &str) -> Result<Deployment> {
        let path = format!("{}/{}", deployments_path(project_id), deployment_id);
        self.request(Method::GET, &path, &[], None).await
    }

    /// Fetch the logs of a deployment.
    ///
    /// The API offers no stable endpoint for this; always fails without
    /// sending a request.
    pub async fn get_logs(&self, project_id: &str, deployment_id: &str) -> Result<Vec<String>> {
        Err(ProviderError::Unimplemented(format!(
            "logs of deployment {} in project {} are not supported",
            deployment_id, project_id
        )))
    }
}
