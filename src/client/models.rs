//! Wire types of the Deploy API.
//!
//! Optional relations (a project's GitHub link, its production deployment, a
//! deployment's commit) are `Option`s. A deployment refers back to its
//! project through [`ProjectSummary`] only, so the model stays acyclic.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Environment variables of a project or deployment.
pub type EnvVars = BTreeMap<String, String>;

/// Certificate cipher issued with an RSA key.
pub const TLS_CIPHER_RSA: &str = "rsa";

/// Certificate cipher issued with an EC key.
pub const TLS_CIPHER_EC: &str = "ec";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A Deploy project.
///
/// A project is either linked to a GitHub repository or deployed from a
/// publicly reachable source URL. Every new source URL or push to the default
/// branch creates a new [`Deployment`] and moves `production_deployment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitHubLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_deployment: Option<Deployment>,
    #[serde(default)]
    pub has_production_deployment: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env_vars: EnvVars,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// `has_production_deployment` agrees with `production_deployment`.
    pub fn is_consistent(&self) -> bool {
        self.has_production_deployment == self.production_deployment.is_some()
    }
}

/// Link between a project and a GitHub repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubLink {
    pub repository: Repository,
    /// Source file used as the entrypoint of the project.
    pub entrypoint: String,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A GitHub repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub owner: String,
    pub name: String,
}

/// An immutable version of a project's source code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain_mappings: Vec<DomainMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_commit: Option<CommitInfo>,
    /// Owning project, only present when the deployment is fetched directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSummary>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env_vars: EnvVars,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Identity of the project owning a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
}

/// A domain name bound to a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMapping {
    pub domain: String,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// The commit that triggered a deployment of a GitHub-linked project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_github_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A custom domain name of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub domain: String,
    /// Token expected in the `TXT` verification record.
    pub token: String,
    pub is_validated: bool,
    /// Cipher of each provisioned certificate ([`TLS_CIPHER_RSA`], [`TLS_CIPHER_EC`]).
    #[serde(default, deserialize_with = "null_as_default")]
    pub certificates: Vec<String>,
    pub project_id: String,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A user of the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub login: String,
    pub name: String,
    pub avatar_url: String,
    pub github_id: i64,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub env_vars: EnvVars,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: String,
}

/// Body of a new deployment. `url` must be publicly reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeploymentRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub production: bool,
}

impl NewDeploymentRequest {
    /// A deployment that becomes the project's production deployment.
    pub fn production(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            production: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDomainRequest {
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkProjectRequest {
    pub project_id: String,
    pub organization: String,
    pub repo: String,
    pub entrypoint: String,
}

/// Paging parameters. Zero values are left to the server's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageOptions {
    pub page: u32,
    pub limit: u32,
}

impl PageOptions {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Query pairs for the non-zero options.
    pub fn to_query(self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if self.page != 0 {
            query.push(("page", self.page.to_string()));
        }
        if self.limit != 0 {
            query.push(("limit", self.limit.to_string()));
        }
        query
    }
}

/// Paging metadata returned with a paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingInfo {
    pub page: u32,
    pub count: u32,
    pub limit: u32,
    pub total_count: u32,
    pub total_pages: u32,
}

/// One page of deployments.
///
/// The API answers with a `[deployments, paging]` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Vec<Deployment>, PagingInfo)", into = "(Vec<Deployment>, PagingInfo)")]
pub struct DeploymentPage {
    pub deployments: Vec<Deployment>,
    pub paging: PagingInfo,
}

impl From<(Vec<Deployment>, PagingInfo)> for DeploymentPage {
    fn from((deployments, paging): (Vec<Deployment>, PagingInfo)) -> Self {
        Self {
            deployments,
            paging,
        }
    }
}

impl From<DeploymentPage> for (Vec<Deployment>, PagingInfo) {
    fn from(page: DeploymentPage) -> Self {
        (page.deployments, page.paging)
    }
}
