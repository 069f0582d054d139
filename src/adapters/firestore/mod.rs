//! Firestore REST v1 implementation of [`DocumentStore`].

pub mod value;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::adapters::remote::remote_error;
use crate::config::toml_config::FirestoreSettings;
use crate::domain::model::{Collection, Document, Fields};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{KyoError, Result};

const SERVICE: &str = "Firestore";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    create_time: Option<DateTime<Utc>>,
    update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

impl RawDocument {
    fn into_document(self) -> Result<Document> {
        let id = document_id(&self.name)?;
        Ok(Document {
            id,
            fields: value::decode_fields(&self.fields)?,
            create_time: self.create_time,
            update_time: self.update_time,
        })
    }
}

/// Last segment of `projects/{p}/databases/{d}/documents/{collection}/{id}`.
fn document_id(name: &str) -> Result<String> {
    name.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| KyoError::DecodeError {
            service: SERVICE,
            message: format!("document name without id: '{name}'"),
        })
}

/// Ids the store can address as a single path segment.
fn is_addressable_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains('/') && id.len() <= 1500
}

/// Field paths outside `[A-Za-z_][A-Za-z0-9_]*` must be backtick quoted.
fn quote_field_path(field: &str) -> String {
    let simple = field
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

pub struct FirestoreStore {
    client: Client,
    settings: FirestoreSettings,
}

impl FirestoreStore {
    pub fn new(settings: FirestoreSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    fn documents_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.settings.base_url).map_err(|e| KyoError::InvalidConfigValueError {
            field: "firestore.base_url".to_string(),
            value: self.settings.base_url.clone(),
            reason: e.to_string(),
        })?;

        url.path_segments_mut()
            .map_err(|_| KyoError::ConfigError {
                message: format!("firestore.base_url cannot be a base: {}", self.settings.base_url),
            })?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.settings.project_id.as_str(),
                "databases",
                self.settings.database.as_str(),
                "documents",
            ])
            .extend(segments);

        Ok(url)
    }

    fn collection_url(&self, collection: Collection) -> Result<Url> {
        self.documents_url(&[collection.name()])
    }

    fn document_url(&self, collection: Collection, id: &str) -> Result<Url> {
        self.documents_url(&[collection.name(), id])
    }

    fn keyed(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[("key", self.settings.api_key.as_str())])
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        let url = self.collection_url(collection)?;
        let page_size = self.settings.page_size.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .keyed(self.client.get(url.clone()))
                .query(&[("pageSize", page_size.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            tracing::debug!("📡 Firestore list {} (page token: {:?})", collection, page_token);
            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(remote_error(SERVICE, response).await);
            }

            let page: ListResponse = response.json().await?;
            for raw in page.documents {
                documents.push(raw.into_document()?);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) if page_token.as_ref() == Some(&token) => {
                    return Err(KyoError::DecodeError {
                        service: SERVICE,
                        message: format!("page token '{token}' repeated while listing {collection}"),
                    });
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("📡 Firestore listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        if !is_addressable_id(id) {
            return Ok(None);
        }

        let url = self.document_url(collection, id)?;
        tracing::debug!("📡 Firestore get {}/{}", collection, id);
        let response = self.keyed(self.client.get(url)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let raw: RawDocument = response.json().await?;
                raw.into_document().map(Some)
            }
            _ => Err(remote_error(SERVICE, response).await),
        }
    }

    async fn create(&self, collection: Collection, fields: Fields, id_token: &str) -> Result<String> {
        let url = self.collection_url(collection)?;
        let body = json!({ "fields": value::encode_fields(&fields) });

        let response = self
            .keyed(self.client.post(url))
            .bearer_auth(id_token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(SERVICE, response).await);
        }

        let raw: RawDocument = response.json().await?;
        let id = document_id(&raw.name)?;
        tracing::info!("📝 Created {}/{}", collection, id);
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        remove: &[&str],
        id_token: &str,
    ) -> Result<()> {
        if !is_addressable_id(id) {
            return Err(KyoError::not_found(collection.name(), id));
        }

        let url = self.document_url(collection, id)?;
        // Paths in the mask but absent from the body are deleted
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(String::as_str)
            .chain(remove.iter().copied().filter(|key| !fields.contains_key(*key)))
            .map(|key| ("updateMask.fieldPaths", quote_field_path(key)))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let body = json!({ "fields": value::encode_fields(&fields) });
        let response = self
            .keyed(self.client.patch(url))
            .query(&query)
            .bearer_auth(id_token)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(KyoError::not_found(collection.name(), id)),
            status if status.is_success() => {
                tracing::info!("📝 Updated {}/{}", collection, id);
                Ok(())
            }
            _ => Err(remote_error(SERVICE, response).await),
        }
    }

    async fn delete(&self, collection: Collection, id: &str, id_token: &str) -> Result<()> {
        if !is_addressable_id(id) {
            return Ok(());
        }

        let url = self.document_url(collection, id)?;
        let response = self
            .keyed(self.client.delete(url))
            .bearer_auth(id_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => {
                tracing::info!("🗑️ Deleted {}/{}", collection, id);
                Ok(())
            }
            _ => Err(remote_error(SERVICE, response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store(base_url: &str) -> FirestoreStore {
        FirestoreStore::new(FirestoreSettings {
            base_url: base_url.to_string(),
            project_id: "katalog-test".to_string(),
            database: "(default)".to_string(),
            api_key: "key".to_string(),
            page_size: 300,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_document_url_encodes_segments() {
        let store = store("https://firestore.googleapis.com/");
        let url = store.document_url(Collection::Banners, "a b").unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/katalog-test/databases/(default)/documents/banners/a%20b"
        );
    }

    #[test]
    fn test_document_id_from_name() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/newarrivals/Xyz123").unwrap(),
            "Xyz123"
        );
        assert!(document_id("projects/p/databases/(default)/documents/newarrivals/").is_err());
    }

    #[test]
    fn test_quote_field_path() {
        assert_eq!(quote_field_path("imageUrls"), "imageUrls");
        assert_eq!(quote_field_path("_internal2"), "_internal2");
        assert_eq!(quote_field_path("2fast"), "`2fast`");
        assert_eq!(quote_field_path("sale-price"), "`sale-price`");
    }

    #[test]
    fn test_addressable_ids() {
        assert!(is_addressable_id("AbC123xyz"));
        assert!(!is_addressable_id(""));
        assert!(!is_addressable_id(".."));
        assert!(!is_addressable_id("banners/other"));
    }
}
