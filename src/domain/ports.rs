use crate::domain::model::{Collection, Document, Fields};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Hosted document database holding the catalog collections.
///
/// Reads are anonymous. Writes carry the signed-in admin's ID token so the
/// database's own access rules still apply.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>>;

    /// Stores a new record and returns its generated id.
    async fn create(&self, collection: Collection, fields: Fields, id_token: &str) -> Result<String>;

    /// Overwrites `fields` on an existing record and deletes every field named
    /// in `remove`. Fails with `NotFound` when the record does not exist.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        remove: &[&str],
        id_token: &str,
    ) -> Result<()>;

    async fn delete(&self, collection: Collection, id: &str, id_token: &str) -> Result<()>;
}

/// Tokens handed out after a successful sign-in or refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in_secs: u64,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Identity of a verified admin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub user_id: String,
    pub email: String,
}

/// Hosted email/password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn refresh(&self, refresh_token: &str) -> Result<Session>;

    /// Resolves an ID token to its user, rejecting invalid or expired tokens.
    async fn verify(&self, id_token: &str) -> Result<AdminUser>;
}

/// One image file received from the admin dashboard.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Third-party image host; returns the public URL of the stored image.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String>;
}
