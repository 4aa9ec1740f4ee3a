//! The `deploy_project` resource.
//!
//! A project is deployed either from a source URL or from a linked GitHub
//! repository. Updates only call the endpoints of the attribute groups that
//! actually changed: renaming, replacing environment variables, deploying a
//! new source URL, and linking or unlinking GitHub.
//!
//! Multi-call operations are not rolled back: if linking GitHub fails after
//! the project was created, the project stays.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::models::{
    CommitInfo, Deployment, DomainMapping, EnvVars, LinkProjectRequest, NewDeploymentRequest,
    Project,
};
use crate::client::Client;
use crate::error::Result;
use crate::resource::{decode_state, encode_state, require_id, Resource};
use crate::schema::{Attribute, AttributeType, Block, NestedBlock, Schema};
use crate::types::{diff_attributes, AttributeChange};

/// Resource type name.
pub const PROJECT_RESOURCE: &str = "deploy_project";

/// Observed and desired state of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectState {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub source_url: Option<String>,
    pub github_link: Option<GitHubLinkBlock>,
    pub env_vars: EnvVars,
    pub production_deployment: Option<ProductionDeploymentBlock>,
    pub has_production_deployment: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubLinkBlock {
    pub organization: String,
    pub repo: String,
    pub entrypoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionDeploymentBlock {
    pub id: String,
    pub url: String,
    pub domain_mappings: Vec<DomainMappingBlock>,
    pub related_commit: Option<CommitBlock>,
    pub env_vars: EnvVars,
    pub updated_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainMappingBlock {
    pub domain: String,
    pub updated_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitBlock {
    pub hash: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub author_github_username: Option<String>,
    pub url: Option<String>,
}

impl From<&DomainMapping> for DomainMappingBlock {
    fn from(mapping: &DomainMapping) -> Self {
        Self {
            domain: mapping.domain.clone(),
            updated_at: mapping.updated_at.to_rfc3339(),
            created_at: mapping.created_at.to_rfc3339(),
        }
    }
}

impl From<&CommitInfo> for CommitBlock {
    fn from(commit: &CommitInfo) -> Self {
        Self {
            hash: commit.hash.clone(),
            message: commit.message.clone(),
            author_name: commit.author_name.clone(),
            author_email: commit.author_email.clone(),
            author_github_username: commit.author_github_username.clone(),
            url: commit.url.clone(),
        }
    }
}

impl From<&Deployment> for ProductionDeploymentBlock {
    fn from(deployment: &Deployment) -> Self {
        Self {
            id: deployment.id.clone(),
            url: deployment.url.clone(),
            domain_mappings: deployment.domain_mappings.iter().map(Into::into).collect(),
            related_commit: deployment.related_commit.as_ref().map(Into::into),
            env_vars: deployment.env_vars.clone(),
            updated_at: deployment.updated_at.to_rfc3339(),
            created_at: deployment.created_at.to_rfc3339(),
        }
    }
}

impl ProjectState {
    /// Project the API entity onto the state, keeping `previous` for
    /// attributes the API does not echo back.
    pub fn observe(previous: &ProjectState, project: &Project) -> Self {
        let production_deployment = project
            .production_deployment
            .as_ref()
            .map(ProductionDeploymentBlock::from);

        // source_url is only tracked once configured; it follows the live deployment
        let source_url = match (&previous.source_url, &project.production_deployment) {
            (Some(_), Some(deployment)) => Some(deployment.url.clone()),
            (source_url, _) => source_url.clone(),
        };

        let github_link = project.git.as_ref().map(|git| GitHubLinkBlock {
            organization: git.repository.owner.clone(),
            repo: git.repository.name.clone(),
            entrypoint: git.entrypoint.clone(),
        });

        Self {
            id: project.id.clone(),
            project_id: project.id.clone(),
            name: project.name.clone(),
            source_url,
            github_link,
            env_vars: project.env_vars.clone(),
            has_production_deployment: production_deployment.is_some(),
            production_deployment,
        }
    }

    fn link_request(&self, project_id: &str) -> Option<LinkProjectRequest> {
        self.github_link.as_ref().map(|link| LinkProjectRequest {
            project_id: project_id.to_string(),
            organization: link.organization.clone(),
            repo: link.repo.clone(),
            entrypoint: link.entrypoint.clone(),
        })
    }
}

/// The `deploy_project` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectResource;

impl ProjectResource {
    async fn observe(&self, client: &Client, previous: &ProjectState) -> Result<Value> {
        let id = require_id(PROJECT_RESOURCE, &previous.id)?;
        let project = client.get_project(id).await?;
        if !project.is_consistent() {
            warn!(
                project_id = id,
                "Project reports a production deployment flag that disagrees with its deployment"
            );
        }
        encode_state(&ProjectState::observe(previous, &project))
    }
}

fn find<'a>(changes: &'a [AttributeChange], path: &str) -> Option<&'a AttributeChange> {
    changes.iter().find(|c| c.path == path)
}

fn deployment_block() -> Block {
    let commit = Block::new()
        .with_attribute("hash", Attribute::computed_string())
        .with_attribute("message", Attribute::computed_string())
        .with_attribute("author_name", Attribute::computed_string())
        .with_attribute("author_email", Attribute::computed_string())
        .with_attribute("author_github_username", Attribute::computed_string())
        .with_attribute("url", Attribute::computed_string());

    let mapping = Block::new()
        .with_attribute("domain", Attribute::computed_string())
        .with_attribute("updated_at", Attribute::computed_string())
        .with_attribute("created_at", Attribute::computed_string());

    Block::new()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("url", Attribute::computed_string())
        .with_attribute(
            "env_vars",
            Attribute::new(
                AttributeType::map(AttributeType::String),
                crate::schema::AttributeFlags::computed(),
            ),
        )
        .with_attribute("updated_at", Attribute::computed_string())
        .with_attribute("created_at", Attribute::computed_string())
        .with_block("domain_mappings", NestedBlock::list(mapping).computed())
        .with_block("related_commit", NestedBlock::single(commit).computed())
}

#[async_trait::async_trait]
impl Resource for ProjectResource {
    fn type_name(&self) -> &'static str {
        PROJECT_RESOURCE
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("project_id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Name of the project"),
            )
            .with_attribute(
                "source_url",
                Attribute::optional_string()
                    .with_description("Publicly reachable URL of the entrypoint to deploy")
                    .with_conflicts_with("github_link"),
            )
            .with_attribute("env_vars", Attribute::optional_string_map())
            .with_attribute("has_production_deployment", Attribute::computed_bool())
            .with_block(
                "github_link",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("organization", Attribute::required_string())
                        .with_attribute("repo", Attribute::required_string())
                        .with_attribute("entrypoint", Attribute::required_string()),
                )
                .with_conflicts_with("source_url"),
            )
            .with_block(
                "production_deployment",
                NestedBlock::single(deployment_block()).computed(),
            )
    }

    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value> {
        let mut desired: ProjectState = decode_state(planned_state)?;

        let project = client
            .create_project(&desired.name, desired.env_vars.clone())
            .await?;
        info!(project_id = %project.id, name = %project.name, "Created project");

        if let Some(source_url) = &desired.source_url {
            let deployment = client
                .create_deployment(&project.id, &NewDeploymentRequest::production(source_url))
                .await?;
            info!(project_id = %project.id, deployment_id = %deployment.id, "Created production deployment");
        } else if let Some(link) = desired.link_request(&project.id) {
            client.link_github(&link).await?;
            info!(project_id = %project.id, repo = %link.repo, "Linked GitHub repository");
        }

        desired.id = project.id;
        self.observe(client, &desired).await
    }

    async fn read(&self, client: &Client, current_state: Value) -> Result<Value> {
        let current: ProjectState = decode_state(current_state)?;
        self.observe(client, &current).await
    }

    async fn update(
        &self,
        client: &Client,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value> {
        let schema = self.schema();
        let changes = diff_attributes(&prior_state, &planned_state, |key| {
            schema.is_computed_only(key)
        });
        if changes.is_empty() {
            debug!("Project has no changes");
            return Ok(prior_state);
        }

        let prior: ProjectState = decode_state(prior_state)?;
        let mut desired: ProjectState = decode_state(planned_state)?;
        let id = require_id(PROJECT_RESOURCE, &prior.id)?.to_string();

        if find(&changes, "name").is_some() {
            client.update_project(&id, &desired.name).await?;
            info!(project_id = %id, name = %desired.name, "Renamed project");
        }

        if find(&changes, "env_vars").is_some() {
            client.update_env_vars(&id, &desired.env_vars).await?;
            info!(project_id = %id, count = desired.env_vars.len(), "Replaced environment variables");
        }

        if find(&changes, "source_url").is_some() {
            if let Some(source_url) = &desired.source_url {
                let deployment = client
                    .create_deployment(&id, &NewDeploymentRequest::production(source_url))
                    .await?;
                info!(project_id = %id, deployment_id = %deployment.id, "Created production deployment");
            }
        }

        if let Some(change) = find(&changes, "github_link") {
            match desired.link_request(&id) {
                Some(link) => {
                    client.link_github(&link).await?;
                    info!(project_id = %id, repo = %link.repo, "Linked GitHub repository");
                },
                None if change.is_removal() => {
                    client.unlink_github(&id).await?;
                    info!(project_id = %id, "Unlinked GitHub repository");
                },
                None => {},
            }
        }

        desired.id = id;
        self.observe(client, &desired).await
    }

    async fn delete(&self, client: &Client, current_state: Value) -> Result<()> {
        let current: ProjectState = decode_state(current_state)?;
        let id = require_id(PROJECT_RESOURCE, &current.id)?;
        match client.delete_project(id).await {
            Ok(()) => {
                info!(project_id = id, "Deleted project");
                Ok(())
            },
            Err(e) if e.is_not_found() => {
                debug!(project_id = id, "Project already deleted");
                Ok(())
            },
            Err(e) => Err(e),
        }
    }

    async fn import(&self, client: &Client, id: &str) -> Result<Value> {
        let state = ProjectState {
            id: id.to_string(),
            ..Default::default()
        };
        self.observe(client, &state).await
    }
}
