//! Custom domain operations.

use super::models::{AddDomainRequest, Domain};
use super::projects::project_path;
use super::{encode, Client, Method};
use crate::error::Result;

fn domains_path(project_id: &str) -> String {
    format!("{}/domains", project_path(project_id))
}

fn domain_path(project_id: &str, domain: &str) -> String {
    format!("{}/{}", domains_path(project_id), domain)
}

impl Client {
    /// List the custom domains of a project.
    pub async fn list_domains(&self, project_id: &str) -> Result<Vec<Domain>> {
        self.request(Method::GET, &domains_path(project_id), &[], None)
            .await
    }

    /// Add a custom domain to a project. Usually followed by [`Client::verify_domain`].
    pub async fn add_domain(&self, project_id: &str, domain: &str) -> Result<Domain> {
        let body = encode(&AddDomainRequest {
            domain: domain.to_string(),
        })?;
        self.request(Method::POST, &domains_path(project_id), &[], Some(body))
            .await
    }

    /// Get a custom domain, including the token for its verification record.
    pub async fn get_domain(&self, project_id: &str, domain: &str) -> Result<Domain> {
        self.request(Method::GET, &domain_path(project_id, domain), &[], None)
            .await
    }

    /// Remove a custom domain from a project.
    ///
    /// DNS records at the registrar are left in place.
    pub async fn delete_domain(&self, project_id: &str, domain: &str) -> Result<()> {
        self.request_unit(Method::DELETE, &domain_path(project_id, domain), None)
            .await
    }

    /// Ask the API to check the DNS records of a custom domain.
    ///
    /// The records must already exist; they are not created here.
    pub async fn verify_domain(&self, project_id: &str, domain: &str) -> Result<()> {
        let path = format!("{}/verify", domain_path(project_id, domain));
        self.request_unit(Method::POST, &path, None).await
    }

    /// Provision a TLS certificate for a verified custom domain.
    pub async fn provision_certificate(&self, project_id: &str, domain: &str) -> Result<()> {
        let path = format!("{}/certificates", domain_path(project_id, domain));
        self.request_unit(Method::POST, &path, None).await
    }
}
