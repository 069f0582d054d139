//! JSON view models served to the storefront pages.

use serde::Serialize;

use crate::domain::model::{Collection, Product};

pub const UNTITLED: &str = "Tanpa Judul";
pub const SEARCH_PROMPT: &str = "Ketik kata kunci untuk mencari produk.";
pub const NOT_FOUND_MESSAGE: &str = "Produk tidak ditemukan.";

/// A tile in the carousel, the new-arrivals strip, the category grid or the
/// search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: String,
    pub collection: Collection,
    pub title: String,
    pub price: i64,
    pub price_label: String,
    pub image_url: String,
    pub best_seller: bool,
    pub link: String,
}

impl ProductCard {
    /// Card headed by the product title, falling back to [`UNTITLED`].
    pub fn titled(product: &Product) -> Self {
        let title = if product.title.is_empty() {
            UNTITLED.to_string()
        } else {
            product.title.clone()
        };
        Self::build(product, title)
    }

    /// Card headed by the product name, used by the strip and the grid.
    pub fn named(product: &Product) -> Self {
        Self::build(product, product.name.clone())
    }

    fn build(product: &Product, title: String) -> Self {
        let price = product.price.amount();
        Self {
            id: product.id.clone(),
            collection: product.collection,
            title,
            price,
            price_label: crate::core::normalize::format_rupiah(price),
            image_url: product.cover_image().unwrap_or_default().to_string(),
            best_seller: product.is_best_seller,
            link: product.collection.detail_link(&product.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: String,
    pub collection: Collection,
    pub title: String,
    pub description: String,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub price_label: String,
    pub image_urls: Vec<String>,
    pub purchase_link: Option<String>,
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        Self {
            price_label: product.price.label(),
            id: product.id,
            collection: product.collection,
            title: product.title,
            description: product.description,
            colors: product.colors,
            sizes: product.sizes,
            image_urls: product.image_urls,
            purchase_link: product.purchase_link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub banners: Vec<ProductCard>,
    pub new_arrivals: Vec<ProductCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub keyword: String,
    pub hits: Vec<ProductCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Document, FieldValue};

    fn product(fields: Vec<(&str, FieldValue)>) -> Product {
        let doc = Document::new(
            "p1",
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        );
        Product::from_document(Collection::Banners, &doc)
    }

    #[test]
    fn test_titled_card_uses_placeholder_title() {
        let card = ProductCard::titled(&product(vec![("price", "45000".into())]));
        assert_eq!(card.title, UNTITLED);
        assert_eq!(card.price, 45000);
        assert_eq!(card.price_label, "Rp45.000");
        assert_eq!(card.image_url, "");
        assert_eq!(card.link, "/banner/p1");
    }

    #[test]
    fn test_detail_keeps_unparseable_price_text() {
        let detail = ProductDetail::from(product(vec![
            ("title", "Sweater".into()),
            ("price", "Harga spesial".into()),
        ]));
        assert_eq!(detail.price_label, "Harga spesial");
        assert_eq!(detail.title, "Sweater");
    }

    #[test]
    fn test_search_results_omit_empty_message() {
        let results = SearchResults {
            keyword: "kaos".to_string(),
            hits: Vec::new(),
            message: None,
        };
        let json = serde_json::to_value(&results).unwrap();
        assert!(json.get("message").is_none());
    }
}
