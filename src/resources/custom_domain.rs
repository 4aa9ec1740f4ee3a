//! The `deploy_custom_domain` resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::models::Domain;
use crate::client::Client;
use crate::error::{ProviderError, Result};
use crate::resource::{decode_state, encode_state, require_id, Resource};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};
use crate::types::diff_attributes;

/// Resource type name.
pub const CUSTOM_DOMAIN_RESOURCE: &str = "deploy_custom_domain";

/// IPv4 address custom domains must point to.
pub const DEPLOY_IPV4: &str = "34.120.54.55";

/// IPv6 address custom domains must point to.
pub const DEPLOY_IPV6: &str = "2600:1901:0:6d85::";

/// A DNS record the user has to create at their registrar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsRecord {
    pub domain_name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
}

/// DNS records needed to route and verify `domain`.
pub fn dns_records(domain: &Domain) -> Vec<DnsRecord> {
    let record = |record_type: &str, value: String| DnsRecord {
        domain_name: domain.domain.clone(),
        record_type: record_type.to_string(),
        value,
    };
    vec![
        record("A", DEPLOY_IPV4.to_string()),
        record("AAAA", DEPLOY_IPV6.to_string()),
        record("TXT", format!("deno-com-validation={}", domain.token)),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomDomainState {
    pub id: String,
    pub project_id: String,
    pub domain_name: String,
    pub records: Vec<DnsRecord>,
    pub token: String,
    pub is_validated: bool,
    pub certificates: Vec<String>,
}

impl CustomDomainState {
    fn observe(domain: &Domain) -> Self {
        Self {
            id: domain.domain.clone(),
            project_id: domain.project_id.clone(),
            domain_name: domain.domain.clone(),
            records: dns_records(domain),
            token: domain.token.clone(),
            is_validated: domain.is_validated,
            certificates: domain.certificates.clone(),
        }
    }

    /// Domain name to address, preferring the identity.
    fn domain(&self) -> &str {
        if self.id.is_empty() {
            &self.domain_name
        } else {
            &self.id
        }
    }
}

/// The `deploy_custom_domain` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomDomainResource;

impl CustomDomainResource {
    async fn observe(&self, client: &Client, project_id: &str, domain: &str) -> Result<Value> {
        let project_id = require_id(CUSTOM_DOMAIN_RESOURCE, project_id)?;
        let domain = client.get_domain(project_id, domain).await?;
        let mut state = CustomDomainState::observe(&domain);
        if state.project_id.is_empty() {
            state.project_id = project_id.to_string();
        }
        encode_state(&state)
    }
}

#[async_trait::async_trait]
impl Resource for CustomDomainResource {
    fn type_name(&self) -> &'static str {
        CUSTOM_DOMAIN_RESOURCE
    }

    fn schema(&self) -> Schema {
        let record = Block::new()
            .with_attribute("domain_name", Attribute::computed_string())
            .with_attribute("type", Attribute::computed_string())
            .with_attribute("value", Attribute::computed_string());

        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("project_id", Attribute::required_string().with_force_new())
            .with_attribute("domain_name", Attribute::required_string().with_force_new())
            .with_attribute("token", Attribute::computed_string())
            .with_attribute("is_validated", Attribute::computed_bool())
            .with_attribute(
                "certificates",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::computed(),
                ),
            )
            .with_block("records", NestedBlock::list(record).computed())
    }

    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value> {
        let desired: CustomDomainState = decode_state(planned_state)?;
        let project_id = require_id(CUSTOM_DOMAIN_RESOURCE, &desired.project_id)?;

        let domain = client.add_domain(project_id, &desired.domain_name).await?;
        info!(project_id, domain = %domain.domain, "Added custom domain");

        self.observe(client, project_id, &desired.domain_name).await
    }

    async fn read(&self, client: &Client, current_state: Value) -> Result<Value> {
        let current: CustomDomainState = decode_state(current_state)?;
        self.observe(client, &current.project_id, current.domain())
            .await
    }

    async fn update(
        &self,
        _client: &Client,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value> {
        let schema = self.schema();
        let changes = diff_attributes(&prior_state, &planned_state, |key| {
            schema.is_computed_only(key)
        });
        if changes.is_empty() {
            return Ok(prior_state);
        }
        Err(ProviderError::InvalidRequest(format!(
            "{} cannot be updated in place; changed: {}",
            CUSTOM_DOMAIN_RESOURCE,
            changes
                .iter()
                .map(|c| c.path.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    async fn delete(&self, client: &Client, current_state: Value) -> Result<()> {
        let current: CustomDomainState = decode_state(current_state)?;
        let project_id = require_id(CUSTOM_DOMAIN_RESOURCE, &current.project_id)?;
        match client.delete_domain(project_id, current.domain()).await {
            Ok(()) => {
                info!(project_id, domain = current.domain(), "Removed custom domain");
                Ok(())
            },
            Err(e) if e.is_not_found() => {
                debug!(project_id, domain = current.domain(), "Custom domain already removed");
                Ok(())
            },
            Err(e) => Err(e),
        }
    }

    /// Import ID format: `<project_id>/<domain_name>`.
    async fn import(&self, client: &Client, id: &str) -> Result<Value> {
        match id.split_once('/') {
            Some((project_id, domain)) if !project_id.is_empty() && !domain.is_empty() => {
                self.observe(client, project_id, domain).await
            },
            _ => Err(ProviderError::InvalidRequest(format!(
                "expected import ID <project_id>/<domain_name>, got {id:?}"
            ))),
        }
    }
}
