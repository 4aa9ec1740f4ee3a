//! Resource adapters.

#![allow(missing_docs)]

pub mod custom_domain;
pub mod custom_domain_validation;
pub mod project;

pub use custom_domain::{CustomDomainResource, CUSTOM_DOMAIN_RESOURCE};
pub use custom_domain_validation::{
    CustomDomainValidationResource, CUSTOM_DOMAIN_VALIDATION_RESOURCE,
};
pub use project::{ProjectResource, PROJECT_RESOURCE};
