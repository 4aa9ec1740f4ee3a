//! The host-facing provider surface.
//!
//! [`ProviderService`] is what an infrastructure host calls into. The
//! [`DeployProvider`] implements it by dispatching to registered
//! [`Resource`] and [`DataSource`] implementations by type name.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::client::Client;
use crate::config::ProviderConfig;
use crate::data_sources::UserDataSource;
use crate::error::{ProviderError, Result};
use crate::resource::{DataSource, Resource};
use crate::resources::{CustomDomainResource, CustomDomainValidationResource, ProjectResource};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::types::{diff_attributes, ImportedResource, PlanResult, ProviderMetadata};
use crate::validation::validate;

/// Operations an infrastructure host invokes on a provider.
///
/// # Example
///
/// ```no_run
/// use deploy_provider::{DeployProvider, ProviderService};
/// use serde_json::json;
///
/// # async fn run() -> Result<(), deploy_provider::ProviderError> {
/// let provider = DeployProvider::new();
/// let diagnostics = provider.configure(json!({"api_token": "ddp_..."})).await?;
/// assert!(diagnostics.is_empty());
///
/// let state = provider.create("deploy_project", json!({"name": "demo"})).await?;
/// println!("created project {}", state["id"]);
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Return the provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Resource and data source type names, sorted.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.keys().cloned().collect();
        let mut data_sources: Vec<String> = schema.data_sources.keys().cloned().collect();
        resources.sort();
        data_sources.sort();
        ProviderMetadata {
            resources,
            data_sources,
        }
    }

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>>;

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Plan changes for a resource. `prior_state` is `None` on create and
    /// `proposed_state` is null on destroy.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult>;

    /// Create a new resource.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value>;

    /// Read the current state of a resource. `None` means it no longer exists.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<()>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for {resource_type}"
        )))
    }

    /// Read data from a data source.
    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value> {
        let _ = config;
        Err(ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

/// The Deploy provider: a registry of resources and data sources sharing one
/// configured [`Client`].
pub struct DeployProvider {
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
    client: OnceLock<Client>,
}

impl std::fmt::Debug for DeployProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployProvider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("configured", &self.client.get().is_some())
            .finish()
    }
}

impl Default for DeployProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DeployProvider {
    /// A provider with every Deploy resource and data source registered.
    pub fn new() -> Self {
        Self::empty()
            .with_resource(ProjectResource)
            .with_resource(CustomDomainResource)
            .with_resource(CustomDomainValidationResource)
            .with_data_source(UserDataSource)
    }

    /// A provider with nothing registered.
    pub fn empty() -> Self {
        Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
            client: OnceLock::new(),
        }
    }

    /// Register a resource under its type name.
    pub fn with_resource(mut self, resource: impl Resource) -> Self {
        self.resources.insert(resource.type_name(), Box::new(resource));
        self
    }

    /// Register a data source under its type name.
    pub fn with_data_source(mut self, data_source: impl DataSource) -> Self {
        self.data_sources
            .insert(data_source.type_name(), Box::new(data_source));
        self
    }

    /// Use an already configured client instead of waiting for `configure`.
    pub fn with_client(self, client: Client) -> Self {
        // A fresh OnceLock is always empty.
        let _ = self.client.set(client);
        self
    }

    /// The configured client.
    pub fn client(&self) -> Result<&Client> {
        self.client.get().ok_or_else(|| {
            ProviderError::FailedPrecondition("provider has not been configured".to_string())
        })
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource> {
        self.data_sources
            .get(data_source_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

/// Summarise error diagnostics into a single validation error.
fn diagnostics_to_error(diagnostics: &[Diagnostic]) -> Option<ProviderError> {
    let messages: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| match &d.attribute {
            Some(attr) => format!("{attr}: {}", d.summary),
            None => d.summary.clone(),
        })
        .collect();
    if messages.is_empty() {
        None
    } else {
        Some(ProviderError::Validation(messages.join("; ")))
    }
}

/// Carry computed-only values from the prior state into a proposal that
/// leaves them unset.
fn merge_computed(schema: &Schema, prior: &Value, mut proposed: Value) -> Value {
    if let (Some(prior), Some(planned)) = (prior.as_object(), proposed.as_object_mut()) {
        for (key, value) in prior {
            let unset = planned.get(key).map_or(true, Value::is_null);
            if unset && schema.is_computed_only(key) {
                planned.insert(key.clone(), value.clone());
            }
        }
    }
    proposed
}

#[async_trait::async_trait]
impl ProviderService for DeployProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        for (name, resource) in &self.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>> {
        let mut diagnostics = validate(&ProviderConfig::schema(), &config);
        if diagnostics.is_empty() {
            if let Err(e) = ProviderConfig::from_value(config) {
                diagnostics.push(Diagnostic::error(e.to_string()));
            }
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>> {
        let config = match ProviderConfig::from_value(config) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Provider configuration rejected");
                return Ok(vec![Diagnostic::error("Invalid provider configuration")
                    .with_detail(e.to_string())]);
            },
        };

        let client = Client::new(&config)?;
        if self.client.set(client).is_err() {
            return Ok(vec![Diagnostic::error("Provider is already configured")]);
        }
        info!(base_url = %config.base_url, "Provider configured");
        Ok(vec![])
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>> {
        let resource = self.resource(resource_type)?;
        Ok(validate(&resource.schema(), &config))
    }

    #[instrument(skip(self, prior_state, proposed_state, _config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult> {
        let schema = self.resource(resource_type)?.schema();

        let Some(prior) = prior_state else {
            if let Some(err) = diagnostics_to_error(&validate(&schema, &proposed_state)) {
                return Err(err);
            }
            let changes = diff_attributes(&Value::Object(Map::new()), &proposed_state, |key| {
                schema.is_computed_only(key)
            });
            debug!(changes = changes.len(), "Planned create");
            return Ok(PlanResult::with_changes(proposed_state, changes, false));
        };

        if proposed_state.is_null() {
            let changes = diff_attributes(&prior, &Value::Null, |_| false);
            debug!(changes = changes.len(), "Planned destroy");
            return Ok(PlanResult::with_changes(Value::Null, changes, false));
        }

        if let Some(err) = diagnostics_to_error(&validate(&schema, &proposed_state)) {
            return Err(err);
        }
        let planned = merge_computed(&schema, &prior, proposed_state);
        let changes = diff_attributes(&prior, &planned, |key| schema.is_computed_only(key));
        if changes.is_empty() {
            return Ok(PlanResult::no_change(planned));
        }

        let force_new = schema.force_new_attributes();
        let requires_replace = changes
            .iter()
            .any(|c| force_new.contains(&c.path.as_str()));
        debug!(changes = changes.len(), requires_replace, "Planned update");
        Ok(PlanResult::with_changes(planned, changes, requires_replace))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        resource
            .create(client, planned_state)
            .await
            .inspect_err(|e| error!(error = %e, "Create failed"))
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        match resource.read(client, current_state).await {
            Ok(state) => Ok(Some(state)),
            Err(e) if e.is_not_found() => {
                info!("Resource no longer exists");
                Ok(None)
            },
            Err(e) => {
                error!(error = %e, "Read failed");
                Err(e)
            },
        }
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        resource
            .update(client, prior_state, planned_state)
            .await
            .inspect_err(|e| error!(error = %e, "Update failed"))
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<()> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        resource
            .delete(client, current_state)
            .await
            .inspect_err(|e| error!(error = %e, "Delete failed"))
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        let state = resource.import(client, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client()?;
        data_source.read(client, config).await
    }
}
