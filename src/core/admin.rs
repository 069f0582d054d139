use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;

use crate::config::toml_config::ImageSettings;
use crate::domain::model::{Collection, Product, ProductDraft, LEGACY_IMAGE_FIELD};
use crate::domain::ports::{DocumentStore, ImageHost, ImageUpload};
use crate::utils::error::{KyoError, Result};

/// Room left per multipart part for its boundary and headers.
const PART_FRAMING_BYTES: usize = 16 * 1024;

/// Per-request upload limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_bytes: usize,
    pub max_files: usize,
}

impl UploadLimits {
    /// Largest multipart body a single upload request may carry: every file
    /// at `max_bytes` plus framing for each part and the closing boundary.
    pub fn body_limit(&self) -> usize {
        self.max_bytes
            .saturating_mul(self.max_files)
            .saturating_add(PART_FRAMING_BYTES.saturating_mul(self.max_files.saturating_add(1)))
    }

    fn check(&self, files: &[ImageUpload]) -> Result<()> {
        if files.is_empty() {
            return Err(KyoError::validation("Select at least one image to upload."));
        }
        if files.len() > self.max_files {
            return Err(KyoError::validation(format!(
                "At most {} images can be uploaded at once.",
                self.max_files
            )));
        }

        for file in files {
            if !file.content_type.starts_with("image/") {
                return Err(KyoError::validation(format!(
                    "{} is not an image.",
                    file.file_name
                )));
            }
            if file.bytes.is_empty() {
                return Err(KyoError::validation(format!("{} is empty.", file.file_name)));
            }
            if file.bytes.len() > self.max_bytes {
                return Err(KyoError::validation(format!(
                    "{} is larger than {} bytes.",
                    file.file_name, self.max_bytes
                )));
            }
        }
        Ok(())
    }
}

impl From<&ImageSettings> for UploadLimits {
    fn from(settings: &ImageSettings) -> Self {
        Self {
            max_bytes: settings.max_upload_bytes,
            max_files: settings.max_files,
        }
    }
}

/// 後台管理：三個商品集合的增刪改查與圖片上傳
#[derive(Clone)]
pub struct AdminConsole {
    store: Arc<dyn DocumentStore>,
    images: Arc<dyn ImageHost>,
    limits: UploadLimits,
}

impl AdminConsole {
    pub fn new(store: Arc<dyn DocumentStore>, images: Arc<dyn ImageHost>, limits: UploadLimits) -> Self {
        Self {
            store,
            images,
            limits,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Every record of `collection`, newest first; undated records go last.
    pub async fn list(&self, collection: Collection) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self
            .store
            .list(collection)
            .await?
            .iter()
            .map(|doc| Product::from_document(collection, doc))
            .collect();

        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    /// Edit form prefilled from the stored record.
    pub async fn draft(&self, collection: Collection, id: &str) -> Result<ProductDraft> {
        let document = self
            .store
            .get(collection, id)
            .await?
            .ok_or_else(|| KyoError::not_found(collection.name(), id))?;
        Ok(ProductDraft::from(&Product::from_document(collection, &document)))
    }

    pub async fn create(&self, collection: Collection, draft: &ProductDraft, id_token: &str) -> Result<String> {
        draft.validate()?;
        let fields = draft.to_fields(collection, Utc::now());
        let id = self.store.create(collection, fields, id_token).await?;
        tracing::info!("✅ Added {} '{}' as {}", collection, draft.title.trim(), id);
        Ok(id)
    }

    /// Rewrites the record and drops the legacy single-image field.
    pub async fn update(
        &self,
        collection: Collection,
        id: &str,
        draft: &ProductDraft,
        id_token: &str,
    ) -> Result<()> {
        draft.validate()?;
        let fields = draft.to_fields(collection, Utc::now());
        self.store
            .update(collection, id, fields, &[LEGACY_IMAGE_FIELD], id_token)
            .await?;
        tracing::info!("✅ Updated {} {}", collection, id);
        Ok(())
    }

    pub async fn delete(&self, collection: Collection, id: &str, id_token: &str) -> Result<()> {
        self.store.delete(collection, id, id_token).await?;
        tracing::info!("✅ Deleted {} {}", collection, id);
        Ok(())
    }

    /// Uploads every file concurrently. URLs come back in input order and a
    /// single failure fails the whole batch.
    pub async fn upload_images(&self, files: Vec<ImageUpload>) -> Result<Vec<String>> {
        self.limits.check(&files)?;

        let count = files.len();
        tracing::info!("📤 Uploading {} images", count);
        let urls = try_join_all(files.into_iter().map(|file| self.images.upload(file))).await?;
        tracing::info!("✅ Uploaded {} images", count);
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::model::{Document, FieldValue, Fields};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::assert_err;

    /// Echoes the file name back as a URL; names starting with "bad" fail.
    #[derive(Default)]
    struct FakeHost {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageHost for FakeHost {
        async fn upload(&self, image: ImageUpload) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // later files finish first
            let delay = 30u64.saturating_sub(image.bytes.len() as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if image.file_name.starts_with("bad") {
                return Err(KyoError::RemoteError {
                    service: "Cloudinary",
                    status: 400,
                    message: "Image upload failed".to_string(),
                });
            }
            Ok(format!("https://cdn.test/{}", image.file_name))
        }
    }

    fn image(name: &str, size: usize) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1; size],
        }
    }

    fn console(store: MemoryStore) -> (AdminConsole, Arc<FakeHost>) {
        let host = Arc::new(FakeHost::default());
        let console = AdminConsole::new(
            Arc::new(store),
            host.clone(),
            UploadLimits {
                max_bytes: 64,
                max_files: 3,
            },
        );
        (console, host)
    }

    fn draft(title: &str, images: &[&str]) -> ProductDraft {
        ProductDraft {
            title: title.to_string(),
            colors: "Hitam, Putih".to_string(),
            sizes: "M, L".to_string(),
            price: "125000".to_string(),
            image_urls: images.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_rejects_incomplete_drafts() {
        let (console, _) = console(MemoryStore::new());

        let err = console
            .create(Collection::Banners, &draft("  ", &["https://img/a.jpg"]), "t")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Title and at least one image are required.");

        let err = console
            .create(Collection::Banners, &draft("Kaos", &[""]), "t")
            .await
            .unwrap_err();
        assert!(matches!(err, KyoError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_create_then_draft_round_trips_the_form() {
        let (console, _) = console(MemoryStore::new());
        let input = draft("Kaos Oversize", &["https://img/a.jpg", "https://img/b.jpg"]);

        let id = console.create(Collection::NewArrivals, &input, "t").await.unwrap();
        let form = console.draft(Collection::NewArrivals, &id).await.unwrap();

        assert_eq!(form.title, "Kaos Oversize");
        assert_eq!(form.colors, "Hitam, Putih");
        assert_eq!(form.price, "125000");
        assert_eq!(form.image_urls.len(), 2);
    }

    #[tokio::test]
    async fn test_update_drops_legacy_image_field() {
        let mut fields = Fields::new();
        fields.insert("title".into(), "Lama".into());
        fields.insert("imageUrl".into(), "https://img/legacy.jpg".into());
        let (console, _) = console(MemoryStore::with_documents([(
            Collection::Banners,
            Document::new("b1", fields),
        )]));

        console
            .update(Collection::Banners, "b1", &draft("Baru", &["https://img/new.jpg"]), "t")
            .await
            .unwrap();

        let products = console.list(Collection::Banners).await.unwrap();
        assert_eq!(products[0].title, "Baru");
        assert_eq!(products[0].image_urls, vec!["https://img/new.jpg"]);
        assert!(products[0].is_best_seller);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let (console, _) = console(MemoryStore::new());
        let err = console
            .update(Collection::Banners, "gone", &draft("Kaos", &["https://img/a.jpg"]), "t")
            .await
            .unwrap_err();
        assert!(matches!(err, KyoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_undated_last() {
        let dated = |id: &str, day: u32| {
            let mut fields = Fields::new();
            fields.insert(
                "createdAt".into(),
                FieldValue::Timestamp(Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()),
            );
            (Collection::AllCategories, Document::new(id, fields))
        };
        let (console, _) = console(MemoryStore::with_documents([
            dated("old", 1),
            (Collection::AllCategories, Document::new("undated", Fields::new())),
            dated("new", 20),
        ]));

        let ids: Vec<String> = console
            .list(Collection::AllCategories)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_upload_preserves_input_order() {
        let (console, host) = console(MemoryStore::new());
        let urls = console
            .upload_images(vec![image("a.jpg", 1), image("b.jpg", 10), image("c.jpg", 29)])
            .await
            .unwrap();

        assert_eq!(
            urls,
            vec!["https://cdn.test/a.jpg", "https://cdn.test/b.jpg", "https://cdn.test/c.jpg"]
        );
        assert_eq!(host.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_upload_batch_fails_as_a_whole() {
        let (console, _) = console(MemoryStore::new());
        let err = console
            .upload_images(vec![image("a.jpg", 1), image("bad.jpg", 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, KyoError::RemoteError { .. }));
    }

    #[tokio::test]
    async fn test_upload_checks_run_before_any_upload() {
        let (console, host) = console(MemoryStore::new());

        assert_err!(console.upload_images(Vec::new()).await);
        assert_err!(console.upload_images(vec![image("big.jpg", 65)]).await);

        let mut text = image("notes.txt", 4);
        text.content_type = "text/plain".to_string();
        assert_err!(console.upload_images(vec![image("a.jpg", 1), text]).await);

        let too_many = (0..4).map(|i| image(&format!("{i}.jpg"), 1)).collect();
        assert_err!(console.upload_images(too_many).await);

        assert_eq!(host.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_body_limit() {
        let limits = UploadLimits {
            max_bytes: 10 * 1024 * 1024,
            max_files: 10,
        };
        assert_eq!(limits.body_limit(), 100 * 1024 * 1024 + 11 * 16 * 1024);
        assert!(limits.body_limit() > limits.max_bytes * limits.max_files);
    }
}
