//! Deploy provider
//!
//! An infrastructure provider for the Deploy platform. It manages projects,
//! custom domains and their validation, and exposes the caller's identity as
//! a data source.
//!
//! # Overview
//!
//! - **Client**: a thin REST client for the Deploy API ([`client::Client`])
//! - **Resources**: CRUD adapters from attribute bags to client calls
//!   ([`resources`], [`data_sources`])
//! - **Provider**: the [`ProviderService`] surface a host calls into,
//!   implemented by [`DeployProvider`]
//! - **Schema & validation**: attribute schemas and checks against them
//! - **Logging**: `tracing` subscriber setup writing to stderr
//!
//! # Quick Start
//!
//! ```no_run
//! use deploy_provider::{init_logging, DeployProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = DeployProvider::new();
//!     // Falls back to DEPLOY_TOKEN when api_token is omitted.
//!     provider.configure(json!({})).await?;
//!
//!     let project = provider
//!         .create(
//!             "deploy_project",
//!             json!({"name": "demo", "source_url": "https://example.com/main.ts"}),
//!         )
//!         .await?;
//!     tracing::info!(id = %project["id"], "created");
//!
//!     let user = provider.read_data_source("deploy_user", json!({})).await?;
//!     tracing::info!(login = %user["login"], "running as");
//!     Ok(())
//! }
//! ```
//!
//! # Resources
//!
//! | Type | Identity |
//! |---|---|
//! | `deploy_project` | project id |
//! | `deploy_custom_domain` | domain name (import as `<project_id>/<domain>`) |
//! | `deploy_custom_domain_validation` | domain creation timestamp |
//!
//! Data source: `deploy_user`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;

pub use client::Client;
pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{DeployProvider, ProviderService};
pub use resource::{DataSource, Resource};
pub use schema::ProviderSchema;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

pub use async_trait::async_trait;

pub use serde_json;
pub use tracing;
