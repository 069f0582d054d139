use std::sync::Arc;

use crate::core::normalize::normalize_keyword;
use crate::domain::model::{Collection, Product};
use crate::domain::ports::DocumentStore;
use crate::domain::view::{
    HomePage, ProductCard, ProductDetail, SearchResults, NOT_FOUND_MESSAGE, SEARCH_PROMPT,
};
use crate::utils::error::{KyoError, Result};

/// Read-only storefront queries.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn products(&self, collection: Collection) -> Result<Vec<Product>> {
        let documents = self.store.list(collection).await?;
        tracing::debug!("📦 Loaded {} {} records", documents.len(), collection);
        Ok(documents
            .iter()
            .map(|doc| Product::from_document(collection, doc))
            .collect())
    }

    /// Carousel cards, one per banner record.
    pub async fn banners(&self) -> Result<Vec<ProductCard>> {
        Ok(self
            .products(Collection::Banners)
            .await?
            .iter()
            .map(ProductCard::titled)
            .collect())
    }

    pub async fn new_arrivals(&self) -> Result<Vec<ProductCard>> {
        self.listing(Collection::NewArrivals).await
    }

    pub async fn all_categories(&self) -> Result<Vec<ProductCard>> {
        self.listing(Collection::AllCategories).await
    }

    /// Strip and grid only show complete records.
    async fn listing(&self, collection: Collection) -> Result<Vec<ProductCard>> {
        let products = self.products(collection).await?;
        let total = products.len();
        let cards: Vec<ProductCard> = products
            .iter()
            .filter(|product| is_listable(product))
            .map(ProductCard::named)
            .collect();

        if cards.len() < total {
            tracing::debug!("🧹 Hid {} incomplete {} records", total - cards.len(), collection);
        }
        Ok(cards)
    }

    pub async fn home(&self) -> Result<HomePage> {
        let (banners, new_arrivals) = tokio::try_join!(self.banners(), self.new_arrivals())?;
        Ok(HomePage {
            banners,
            new_arrivals,
        })
    }

    pub async fn product(&self, collection: Collection, id: &str) -> Result<ProductDetail> {
        let document = self
            .store
            .get(collection, id)
            .await?
            .ok_or_else(|| KyoError::not_found(collection.name(), id))?;
        Ok(Product::from_document(collection, &document).into())
    }

    /// Case-insensitive title search across every collection, in
    /// [`Collection::ALL`] order.
    pub async fn search(&self, raw_keyword: &str) -> Result<SearchResults> {
        let keyword = normalize_keyword(raw_keyword);
        if keyword.is_empty() {
            return Ok(SearchResults {
                keyword,
                hits: Vec::new(),
                message: Some(SEARCH_PROMPT),
            });
        }

        let (banners, new_arrivals, all_categories) = tokio::try_join!(
            self.products(Collection::Banners),
            self.products(Collection::NewArrivals),
            self.products(Collection::AllCategories),
        )?;

        let hits: Vec<ProductCard> = banners
            .iter()
            .chain(&new_arrivals)
            .chain(&all_categories)
            .filter(|product| product.title.to_lowercase().contains(&keyword))
            .map(ProductCard::titled)
            .collect();

        tracing::info!("🔍 Search '{}' matched {} products", keyword, hits.len());
        let message = hits.is_empty().then_some(NOT_FOUND_MESSAGE);
        Ok(SearchResults {
            keyword,
            hits,
            message,
        })
    }
}

fn is_listable(product: &Product) -> bool {
    !product.name.is_empty() && product.price.amount() != 0 && product.cover_image().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::model::{Document, FieldValue, Fields};

    fn doc(id: &str, pairs: Vec<(&str, FieldValue)>) -> Document {
        Document::new(
            id,
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Fields>(),
        )
    }

    fn catalog() -> Catalog {
        let store = MemoryStore::with_documents([
            (
                Collection::Banners,
                doc(
                    "b1",
                    vec![
                        ("title", "Hoodie Hitam".into()),
                        ("price", "250000".into()),
                        ("imageUrls", FieldValue::string_array(["https://img/b1.jpg"])),
                        ("isBestSeller", true.into()),
                    ],
                ),
            ),
            (Collection::Banners, doc("b2", vec![("price", "99000".into())])),
            (
                Collection::NewArrivals,
                doc(
                    "n1",
                    vec![
                        ("name", "Kemeja Linen".into()),
                        ("price", FieldValue::Integer(175000)),
                        ("imageUrl", "https://img/n1.jpg".into()),
                    ],
                ),
            ),
            (
                Collection::NewArrivals,
                doc(
                    "n2",
                    vec![
                        ("name", "Tanpa Harga".into()),
                        ("imageUrls", FieldValue::string_array(["https://img/n2.jpg"])),
                    ],
                ),
            ),
            (
                Collection::AllCategories,
                doc(
                    "c1",
                    vec![
                        ("title", "Hoodie Abu".into()),
                        ("name", "Hoodie Abu".into()),
                        ("price", FieldValue::Integer(199000)),
                        ("imageUrls", FieldValue::string_array(["https://img/c1.jpg"])),
                    ],
                ),
            ),
        ]);
        Catalog::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_banners_keep_incomplete_records() {
        let banners = catalog().banners().await.unwrap();
        assert_eq!(banners.len(), 2);

        let untitled = banners.iter().find(|card| card.id == "b2").unwrap();
        assert_eq!(untitled.title, "Tanpa Judul");
        assert_eq!(untitled.image_url, "");
        assert!(banners.iter().any(|card| card.best_seller));
    }

    #[tokio::test]
    async fn test_new_arrivals_drop_unpriced_records() {
        let cards = catalog().new_arrivals().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Kemeja Linen");
        assert_eq!(cards[0].image_url, "https://img/n1.jpg");
        assert_eq!(cards[0].price_label, "Rp175.000");
        assert_eq!(cards[0].link, "/newarrival/n1");
    }

    #[tokio::test]
    async fn test_home_combines_carousel_and_strip() {
        let home = catalog().home().await.unwrap();
        assert_eq!(home.banners.len(), 2);
        assert_eq!(home.new_arrivals.len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_ordered_and_case_insensitive() {
        let results = catalog().search("  HOODIE ").await.unwrap();
        assert_eq!(results.keyword, "hoodie");
        let links: Vec<&str> = results.hits.iter().map(|hit| hit.link.as_str()).collect();
        assert_eq!(links, vec!["/banner/b1", "/allcategories/c1"]);
        assert_eq!(results.message, None);
    }

    #[tokio::test]
    async fn test_search_messages() {
        let empty = catalog().search("   ").await.unwrap();
        assert!(empty.hits.is_empty());
        assert_eq!(empty.message, Some(SEARCH_PROMPT));

        let missing = catalog().search("jaket").await.unwrap();
        assert!(missing.hits.is_empty());
        assert_eq!(missing.message, Some(NOT_FOUND_MESSAGE));
    }

    #[tokio::test]
    async fn test_product_detail_and_not_found() {
        let detail = catalog().product(Collection::Banners, "b1").await.unwrap();
        assert_eq!(detail.price_label, "Rp250.000");

        let err = catalog().product(Collection::Banners, "zzz").await.unwrap_err();
        assert!(matches!(err, KyoError::NotFound { .. }));
    }
}
