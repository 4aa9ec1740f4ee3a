//! Data sources.

pub mod user;

pub use user::{UserDataSource, USER_DATA_SOURCE};
