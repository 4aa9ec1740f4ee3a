//! The `deploy_custom_domain_validation` resource.
//!
//! A logical resource: creating it verifies the DNS records of a custom
//! domain and provisions its certificate. There is nothing to tear down.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::{ProviderError, Result};
use crate::resource::{decode_state, encode_state, require_id, Resource};
use crate::schema::{Attribute, Schema};
use crate::types::diff_attributes;

/// Resource type name.
pub const CUSTOM_DOMAIN_VALIDATION_RESOURCE: &str = "deploy_custom_domain_validation";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomDomainValidationState {
    pub id: String,
    pub project_id: String,
    pub custom_domain: String,
}

/// The `deploy_custom_domain_validation` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomDomainValidationResource;

#[async_trait::async_trait]
impl Resource for CustomDomainValidationResource {
    fn type_name(&self) -> &'static str {
        CUSTOM_DOMAIN_VALIDATION_RESOURCE
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("project_id", Attribute::required_string().with_force_new())
            .with_attribute("custom_domain", Attribute::required_string().with_force_new())
    }

    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value> {
        let mut desired: CustomDomainValidationState = decode_state(planned_state)?;
        let project_id = require_id(CUSTOM_DOMAIN_VALIDATION_RESOURCE, &desired.project_id)?;
        let domain_name = desired.custom_domain.as_str();

        let domain = client.get_domain(project_id, domain_name).await?;
        client.verify_domain(project_id, domain_name).await?;
        debug!(project_id, domain = domain_name, "Verified custom domain");
        client.provision_certificate(project_id, domain_name).await?;
        info!(project_id, domain = domain_name, "Provisioned certificate");

        desired.id = domain.created_at.to_rfc3339();
        self.read(client, encode_state(&desired)?).await
    }

    async fn read(&self, client: &Client, current_state: Value) -> Result<Value> {
        let current: CustomDomainValidationState = decode_state(current_state)?;
        let project_id = require_id(CUSTOM_DOMAIN_VALIDATION_RESOURCE, &current.project_id)?;

        let domain = client.get_domain(project_id, &current.custom_domain).await?;
        if !domain.is_validated || domain.certificates.is_empty() {
            return Err(ProviderError::FailedPrecondition(format!(
                "domain {} is either not validated or does not have any certificates",
                current.custom_domain
            )));
        }

        encode_state(&current)
    }

    async fn update(
        &self,
        _client: &Client,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value> {
        let changes = diff_attributes(&prior_state, &planned_state, |key| key == "id");
        if changes.is_empty() {
            Ok(prior_state)
        } else {
            Err(ProviderError::InvalidRequest(format!(
                "{} cannot be updated in place",
                CUSTOM_DOMAIN_VALIDATION_RESOURCE
            )))
        }
    }

    async fn delete(&self, _client: &Client, _current_state: Value) -> Result<()> {
        Ok(())
    }
}
