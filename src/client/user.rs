use super::models::User;
use super::{Client, Method};
use crate::error::Result;

impl Client {
    /// The user owning the configured token.
    pub async fn current_user(&self) -> Result<User> {
        self.request(Method::GET, "/api/user", &[], None).await
    }
}
