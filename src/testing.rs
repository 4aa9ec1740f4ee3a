//! Test harness for [`ProviderService`] implementations.
//!
//! # Example
//!
//! ```no_run
//! use deploy_provider::testing::ProviderTester;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), deploy_provider::testing::TestError> {
//! // Point the provider at a mock server instead of the real API.
//! let tester = ProviderTester::configured("http://127.0.0.1:8080", "test-token").await?;
//!
//! let state = tester
//!     .lifecycle_create("deploy_project", json!({"name": "demo"}))
//!     .await?;
//! assert_eq!(state["name"], "demo");
//! # Ok(())
//! # }
//! ```

use serde_json::{json, Value};
use thiserror::Error;

use crate::error::ProviderError;
use crate::provider::{DeployProvider, ProviderService};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, PlanResult};

/// Drives a provider through the calls a host would make.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl ProviderTester<DeployProvider> {
    /// A [`DeployProvider`] configured against `base_url`.
    pub async fn configured(base_url: &str, api_token: &str) -> Result<Self, TestError> {
        let tester = Self::new(DeployProvider::new());
        tester
            .configure(json!({"api_token": api_token, "base_url": base_url}))
            .await?;
        Ok(tester)
    }
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Validate provider configuration, failing on error diagnostics.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a resource configuration, failing on error diagnostics.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource. `None` means it is gone.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    /// Read a resource that must still exist.
    async fn read_existing(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.read(resource_type, current_state)
            .await?
            .ok_or_else(|| {
                ProviderError::NotFound(format!("{resource_type} disappeared after apply"))
            })
    }

    /// Plan, create, then read back. Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read_existing(resource_type, created).await
    }

    /// Plan, update, then read back. Returns the state after read.
    ///
    /// A plan that requires replacement fails with
    /// [`ProviderError::FailedPrecondition`].
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        if plan.requires_replace {
            return Err(ProviderError::FailedPrecondition(format!(
                "{resource_type} must be replaced"
            )));
        }
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read_existing(resource_type, updated).await
    }

    /// Plan a destroy, then delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Create, update, then delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone())
            .await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug, Error)]
pub enum TestError {
    /// The operation returned error diagnostics.
    #[error("{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):", diagnostics.len());
    for diag in diagnostics {
        out.push_str(&format!("\n  [{:?}] {}", diag.severity, diag.summary));
        if let Some(detail) = &diag.detail {
            out.push_str(&format!(": {detail}"));
        }
        if let Some(attr) = &diag.attribute {
            out.push_str(&format!(" (at {attr})"));
        }
    }
    out
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Assert that a plan creates something without replacing it.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan changes `path`.
///
/// # Panics
///
/// Panics if the plan does not change `path`.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes_attribute(path),
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error whose summary contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| d.is_error() && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Schema};
    use crate::types::diff_attributes;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Keeps named objects in memory.
    #[derive(Default)]
    struct MemoryProvider {
        objects: Mutex<BTreeMap<String, Value>>,
    }

    #[async_trait::async_trait]
    impl ProviderService for MemoryProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new().with_resource(
                "memory_object",
                Schema::v0()
                    .with_attribute("name", Attribute::required_string().with_force_new())
                    .with_attribute("content", Attribute::optional_string())
                    .with_attribute("id", Attribute::computed_string()),
            )
        }

        async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            if config.get("api_token").is_some() {
                Ok(vec![])
            } else {
                Ok(vec![Diagnostic::error("Missing API token")])
            }
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            let prior = prior_state.unwrap_or_else(|| json!({}));
            let changes = diff_attributes(&prior, &proposed_state, |key| key == "id");
            let requires_replace = changes.iter().any(|c| c.path == "name" && c.before.is_some());
            Ok(PlanResult::with_changes(proposed_state, changes, requires_replace))
        }

        async fn create(
            &self,
            _resource_type: &str,
            mut planned_state: Value,
        ) -> Result<Value, ProviderError> {
            let name = planned_state["name"].as_str().unwrap_or_default().to_string();
            planned_state["id"] = json!(name);
            self.objects
                .lock()
                .unwrap()
                .insert(name, planned_state.clone());
            Ok(planned_state)
        }

        async fn read(
            &self,
            _resource_type: &str,
            current_state: Value,
        ) -> Result<Option<Value>, ProviderError> {
            let id = current_state["id"].as_str().unwrap_or_default();
            Ok(self.objects.lock().unwrap().get(id).cloned())
        }

        async fn update(
            &self,
            _resource_type: &str,
            prior_state: Value,
            mut planned_state: Value,
        ) -> Result<Value, ProviderError> {
            planned_state["id"] = prior_state["id"].clone();
            let id = planned_state["id"].as_str().unwrap_or_default().to_string();
            self.objects
                .lock()
                .unwrap()
                .insert(id, planned_state.clone());
            Ok(planned_state)
        }

        async fn delete(
            &self,
            _resource_type: &str,
            current_state: Value,
        ) -> Result<(), ProviderError> {
            let id = current_state["id"].as_str().unwrap_or_default();
            self.objects.lock().unwrap().remove(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_tester_configure() {
        let tester = ProviderTester::new(MemoryProvider::default());
        assert!(tester.configure(json!({"api_token": "t"})).await.is_ok());

        let err = tester.configure(json!({})).await.unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(ref d) if d.len() == 1));
    }

    #[tokio::test]
    async fn test_tester_resource_types() {
        let tester = ProviderTester::new(MemoryProvider::default());
        assert_eq!(tester.resource_types(), vec!["memory_object"]);
        assert!(tester.data_source_types().is_empty());
    }

    #[tokio::test]
    async fn test_tester_plan_create() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let plan = tester
            .plan_create("memory_object", json!({"name": "a"}))
            .await
            .unwrap();
        assert_plan_creates(&plan);
        assert_plan_changes_attribute(&plan, "name");
    }

    #[tokio::test]
    async fn test_tester_plan_replace() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let plan = tester
            .plan_update("memory_object", json!({"name": "a", "id": "a"}), json!({"name": "b"}))
            .await
            .unwrap();
        assert_plan_replaces(&plan);

        let err = tester
            .lifecycle_update("memory_object", json!({"name": "a", "id": "a"}), json!({"name": "b"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let updated = tester
            .lifecycle_crud(
                "memory_object",
                json!({"name": "a", "content": "one"}),
                json!({"name": "a", "content": "two"}),
            )
            .await
            .unwrap();
        assert_eq!(updated["content"], "two");
        assert_eq!(updated["id"], "a");

        let gone = tester
            .read("memory_object", json!({"id": "a"}))
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_tester_import_default_unsupported() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let err = tester.import_resource("memory_object", "a").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unimplemented(_)));
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("Invalid configuration value")];
        assert_error_contains(&diagnostics, "configuration");
    }

    #[test]
    #[should_panic(expected = "Expected no changes")]
    fn test_assert_plan_no_changes_fails() {
        let plan = PlanResult::with_changes(
            json!({}),
            vec![crate::types::AttributeChange::added("name", json!("a"))],
            false,
        );
        assert_plan_no_changes(&plan);
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("api_token"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = err.to_string();
        assert!(display.contains("2 diagnostic(s)"));
        assert!(display.contains("First error"));
        assert!(display.contains("(at api_token)"));
        assert!(display.contains("Second error: More info"));
    }
}
