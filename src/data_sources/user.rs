//! The `deploy_user` data source: the owner of the configured token.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::models::User;
use crate::client::Client;
use crate::error::Result;
use crate::resource::{encode_state, DataSource};
use crate::schema::{Attribute, Schema};

/// Data source type name.
pub const USER_DATA_SOURCE: &str = "deploy_user";

#[derive(Debug, Serialize)]
struct UserState<'a> {
    id: &'a str,
    name: &'a str,
    login: &'a str,
    github_id: String,
    avatar_url: &'a str,
    is_admin: bool,
}

impl<'a> From<&'a User> for UserState<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: &user.id,
            name: &user.name,
            login: &user.login,
            github_id: user.github_id.to_string(),
            avatar_url: &user.avatar_url,
            is_admin: user.is_admin,
        }
    }
}

/// The `deploy_user` data source.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserDataSource;

#[async_trait::async_trait]
impl DataSource for UserDataSource {
    fn type_name(&self) -> &'static str {
        USER_DATA_SOURCE
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::computed_string())
            .with_attribute("login", Attribute::computed_string())
            .with_attribute("github_id", Attribute::computed_string())
            .with_attribute("avatar_url", Attribute::computed_string())
            .with_attribute("is_admin", Attribute::computed_bool())
    }

    async fn read(&self, client: &Client, _config: Value) -> Result<Value> {
        let user = client.current_user().await?;
        debug!(user_id = %user.id, name = %user.name, "Received caller identity");
        encode_state(&UserState::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_state_stringifies_github_id() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "login": "jane",
            "name": "Jane Doe",
            "avatarUrl": "https://avatars.example.com/u/1",
            "githubId": 1234,
            "isAdmin": false,
            "isBlocked": false,
            "updatedAt": "2021-06-01T12:00:00Z",
            "createdAt": "2021-06-01T12:00:00Z"
        }))
        .unwrap();

        let state = encode_state(&UserState::from(&user)).unwrap();
        assert_eq!(state["github_id"], "1234");
        assert_eq!(state["login"], "jane");
        assert_eq!(state["is_admin"], false);
    }
}
