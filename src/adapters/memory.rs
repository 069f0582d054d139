use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;

use crate::domain::model::{Collection, Document, Fields};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{KyoError, Result};

const ID_LENGTH: usize = 20;

/// In-process document store for local development and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `documents`, keeping their ids.
    pub fn with_documents(documents: impl IntoIterator<Item = (Collection, Document)>) -> Self {
        let mut collections: HashMap<Collection, BTreeMap<String, Document>> = HashMap::new();
        for (collection, document) in documents {
            collections
                .entry(collection)
                .or_default()
                .insert(document.id.clone(), document);
        }
        Self {
            collections: RwLock::new(collections),
        }
    }

    pub async fn insert(&self, collection: Collection, document: Document) {
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(document.id.clone(), document);
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }
}

/// Auto id in the same alphabet and length as Firestore's.
fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .map(char::from)
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn create(&self, collection: Collection, fields: Fields, _id_token: &str) -> Result<String> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        let mut id = generate_id();
        while docs.contains_key(&id) {
            id = generate_id();
        }

        let now = Utc::now();
        docs.insert(
            id.clone(),
            Document {
                id: id.clone(),
                fields,
                create_time: Some(now),
                update_time: Some(now),
            },
        );

        tracing::info!("📝 Created {}/{} (memory)", collection, id);
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        remove: &[&str],
        _id_token: &str,
    ) -> Result<()> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| KyoError::not_found(collection.name(), id))?;

        for key in remove {
            document.fields.remove(*key);
        }
        document.fields.extend(fields);
        document.update_time = Some(Utc::now());

        tracing::info!("📝 Updated {}/{} (memory)", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str, _id_token: &str) -> Result<()> {
        let removed = self
            .collections
            .write()
            .await
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id));

        if removed.is_some() {
            tracing::info!("🗑️ Deleted {}/{} (memory)", collection, id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FieldValue;
    use tokio_test::assert_ok;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    #[tokio::test]
    async fn test_create_generates_firestore_like_ids() {
        let store = MemoryStore::new();
        let id = store
            .create(Collection::Banners, fields(&[("title", "Kaos")]), "token")
            .await
            .unwrap();

        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));

        let doc = store.get(Collection::Banners, &id).await.unwrap().unwrap();
        assert_eq!(doc.get("title"), Some(&FieldValue::from("Kaos")));
        assert!(doc.create_time.is_some());
    }

    #[tokio::test]
    async fn test_update_merges_and_removes_fields() {
        let store = MemoryStore::with_documents([(
            Collection::NewArrivals,
            Document::new("a1", fields(&[("title", "Lama"), ("imageUrl", "https://img/old.jpg")])),
        )]);

        store
            .update(
                Collection::NewArrivals,
                "a1",
                fields(&[("title", "Baru")]),
                &["imageUrl"],
                "token",
            )
            .await
            .unwrap();

        let doc = store.get(Collection::NewArrivals, "a1").await.unwrap().unwrap();
        assert_eq!(doc.get("title"), Some(&FieldValue::from("Baru")));
        assert!(doc.get("imageUrl").is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Banners, "nope", Fields::new(), &[], "token")
            .await
            .unwrap_err();
        assert!(matches!(err, KyoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::with_documents([(Collection::Banners, Document::new("b1", Fields::new()))]);

        assert_ok!(store.delete(Collection::Banners, "b1", "token").await);
        assert_ok!(store.delete(Collection::Banners, "b1", "token").await);
        assert_eq!(store.count(Collection::Banners).await, 0);
    }
}
