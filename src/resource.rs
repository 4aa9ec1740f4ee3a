//! Traits implemented once per resource type and data source.
//!
//! Each implementation translates the host's attribute bag into [`Client`]
//! calls and projects the returned entity back into an attribute bag. The
//! [`DeployProvider`](crate::DeployProvider) registry dispatches to them by
//! type name.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::Client;
use crate::error::{ProviderError, Result};
use crate::schema::Schema;

/// A managed resource type.
#[async_trait::async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Type name used in configuration, e.g. `deploy_project`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema of the resource.
    fn schema(&self) -> Schema;

    /// Create the remote object and return its observed state, including `id`.
    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value>;

    /// Refresh the state of an existing object.
    ///
    /// Fails with [`ProviderError::NotFound`] when the object no longer exists.
    async fn read(&self, client: &Client, current_state: Value) -> Result<Value>;

    /// Apply the difference between `prior_state` and `planned_state`.
    async fn update(&self, client: &Client, prior_state: Value, planned_state: Value)
        -> Result<Value>;

    /// Delete the remote object. An object that is already gone is not an error.
    async fn delete(&self, client: &Client, current_state: Value) -> Result<()>;

    /// Whether the remote object still exists.
    async fn exists(&self, client: &Client, current_state: Value) -> Result<bool> {
        match self.read(client, current_state).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Build the state of an existing object from its import ID.
    async fn import(&self, client: &Client, id: &str) -> Result<Value> {
        let _ = (client, id);
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for {}",
            self.type_name()
        )))
    }
}

/// A read-only data source.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Type name used in configuration, e.g. `deploy_user`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema of the data source.
    fn schema(&self) -> Schema;

    /// Read the data source for the given configuration.
    async fn read(&self, client: &Client, config: Value) -> Result<Value>;
}

/// Decode an attribute bag into a typed state.
pub(crate) fn decode_state<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::InvalidRequest(format!("malformed state: {e}")))
}

/// Encode a typed state into an attribute bag.
pub(crate) fn encode_state<T: Serialize>(state: &T) -> Result<Value> {
    serde_json::to_value(state).map_err(ProviderError::Encode)
}

/// Fail when a state has no identity yet.
pub(crate) fn require_id<'a>(type_name: &str, id: &'a str) -> Result<&'a str> {
    if id.is_empty() {
        Err(ProviderError::InvalidRequest(format!(
            "{type_name} state has no id"
        )))
    } else {
        Ok(id)
    }
}
