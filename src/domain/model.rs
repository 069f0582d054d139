use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::normalize::{format_rupiah, join_list, parse_price_prefix, split_list};
use crate::utils::error::{KyoError, Result};

/// Catalog collections kept in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Banners,
    NewArrivals,
    AllCategories,
}

impl Collection {
    /// Search order across the storefront.
    pub const ALL: [Collection; 3] = [
        Collection::Banners,
        Collection::NewArrivals,
        Collection::AllCategories,
    ];

    /// Collection name in the document store.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Banners => "banners",
            Collection::NewArrivals => "newarrivals",
            Collection::AllCategories => "allcategories",
        }
    }

    /// First path segment of the storefront detail page.
    pub fn route(self) -> &'static str {
        match self {
            Collection::Banners => "banner",
            Collection::NewArrivals => "newarrival",
            Collection::AllCategories => "allcategories",
        }
    }

    pub fn detail_link(self, id: &str) -> String {
        format!("/{}/{}", self.route(), id)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = KyoError;

    fn from_str(s: &str) -> Result<Self> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s || c.route() == s)
            .ok_or_else(|| KyoError::validation(format!("Unknown collection: {s}")))
    }
}

/// A stored field value, mirroring the value kinds the document store knows.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Non-empty string content, ignoring whitespace-only values.
    pub fn as_non_empty_str(&self) -> Option<&str> {
        self.as_str().filter(|s| !s.trim().is_empty())
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            FieldValue::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::Array(
            items
                .into_iter()
                .map(|s| FieldValue::String(s.into()))
                .collect(),
        )
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// A raw record as returned by the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            create_time: None,
            update_time: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_non_empty_str)
    }
}

/// Stored price. Older records keep free text, newer ones a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Price {
    Amount(i64),
    Text(String),
    Missing,
}

impl Price {
    fn from_field(value: Option<&FieldValue>) -> Self {
        match value {
            Some(FieldValue::Integer(n)) => Price::Amount(*n),
            Some(FieldValue::Double(n)) if n.is_finite() => Price::Amount(n.trunc() as i64),
            Some(FieldValue::String(s)) if !s.trim().is_empty() => Price::Text(s.trim().to_string()),
            _ => Price::Missing,
        }
    }

    /// Numeric amount, 0 when nothing numeric is stored.
    pub fn amount(&self) -> i64 {
        match self {
            Price::Amount(n) => *n,
            Price::Text(s) => parse_price_prefix(s).unwrap_or(0),
            Price::Missing => 0,
        }
    }

    /// Display label: rupiah formatting when an amount can be read, otherwise
    /// the stored text verbatim.
    pub fn label(&self) -> String {
        match self {
            Price::Amount(n) => format_rupiah(*n),
            Price::Text(s) => match parse_price_prefix(s) {
                Some(n) => format_rupiah(n),
                None => s.clone(),
            },
            Price::Missing => format_rupiah(0),
        }
    }

    fn form_text(&self) -> String {
        match self {
            Price::Amount(n) => n.to_string(),
            Price::Text(s) => s.clone(),
            Price::Missing => String::new(),
        }
    }
}

/// Normalized catalog record. Every legacy shape found in the store is folded
/// into this one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub collection: Collection,
    pub title: String,
    pub name: String,
    pub description: String,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub price: Price,
    pub image_urls: Vec<String>,
    pub purchase_link: Option<String>,
    pub is_best_seller: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn from_document(collection: Collection, doc: &Document) -> Self {
        let title = doc.text("title").or_else(|| doc.text("name")).unwrap_or("");
        let name = doc.text("name").or_else(|| doc.text("title")).unwrap_or("");

        Self {
            id: doc.id.clone(),
            collection,
            title: title.trim().to_string(),
            name: name.trim().to_string(),
            description: doc
                .get("description")
                .and_then(FieldValue::as_str)
                .unwrap_or_default()
                .to_string(),
            colors: string_list(doc.get("colors")),
            sizes: string_list(doc.get("sizes")),
            price: Price::from_field(doc.get("price")),
            image_urls: image_urls(doc),
            purchase_link: doc.text("purchaseLink").map(|s| s.trim().to_string()),
            is_best_seller: matches!(doc.get("isBestSeller"), Some(FieldValue::Bool(true))),
            created_at: doc
                .get("createdAt")
                .and_then(FieldValue::as_timestamp)
                .or(doc.create_time),
        }
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

/// `imageUrls` wins when it yields at least one URL; a lone legacy `imageUrl`
/// is used otherwise.
fn image_urls(doc: &Document) -> Vec<String> {
    let urls: Vec<String> = doc
        .get("imageUrls")
        .and_then(FieldValue::as_array)
        .unwrap_or_default()
        .iter()
        .filter_map(FieldValue::as_non_empty_str)
        .map(|url| url.trim().to_string())
        .collect();

    if !urls.is_empty() {
        return urls;
    }

    doc.text("imageUrl")
        .map(|url| vec![url.trim().to_string()])
        .unwrap_or_default()
}

fn string_list(value: Option<&FieldValue>) -> Vec<String> {
    match value {
        Some(FieldValue::Array(items)) => items
            .iter()
            .filter_map(FieldValue::as_non_empty_str)
            .map(|s| s.trim().to_string())
            .collect(),
        Some(FieldValue::String(text)) => split_list(text),
        _ => Vec::new(),
    }
}

/// Admin form input for creating or editing a catalog record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    /// Comma separated, e.g. `"Black, White"`.
    pub colors: String,
    /// Comma separated, e.g. `"S, M, L"`.
    pub sizes: String,
    #[serde(deserialize_with = "text_or_number")]
    pub price: String,
    pub image_urls: Vec<String>,
    pub purchase_link: String,
}

pub const DRAFT_REQUIRED_MESSAGE: &str = "Title and at least one image are required.";

/// Legacy single-image field dropped whenever a record is rewritten.
pub const LEGACY_IMAGE_FIELD: &str = "imageUrl";

impl ProductDraft {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.image_urls().is_empty() {
            return Err(KyoError::validation(DRAFT_REQUIRED_MESSAGE));
        }
        Ok(())
    }

    fn image_urls(&self) -> Vec<String> {
        self.image_urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Field set written for `collection`, stamped with `now`.
    pub fn to_fields(&self, collection: Collection, now: DateTime<Utc>) -> Fields {
        let title = self.title.trim().to_string();
        let mut fields = Fields::new();

        fields.insert("title".into(), title.clone().into());
        fields.insert("description".into(), self.description.trim().into());
        fields.insert("colors".into(), FieldValue::string_array(split_list(&self.colors)));
        fields.insert("sizes".into(), FieldValue::string_array(split_list(&self.sizes)));
        fields.insert("imageUrls".into(), FieldValue::string_array(self.image_urls()));
        fields.insert("purchaseLink".into(), self.purchase_link.trim().into());
        fields.insert("createdAt".into(), FieldValue::Timestamp(now));

        match collection {
            Collection::Banners => {
                fields.insert("price".into(), self.price.trim().into());
                fields.insert("isBestSeller".into(), true.into());
            }
            Collection::NewArrivals | Collection::AllCategories => {
                fields.insert("name".into(), title.into());
                let amount = parse_price_prefix(&self.price).unwrap_or(0);
                fields.insert("price".into(), amount.into());
            }
        }

        fields
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            colors: join_list(&product.colors),
            sizes: join_list(&product.sizes),
            price: product.price.form_text(),
            image_urls: product.image_urls.clone(),
            purchase_link: product.purchase_link.clone().unwrap_or_default(),
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Integer(i64),
        Float(f64),
        Null(()),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Integer(n) => n.to_string(),
        TextOrNumber::Float(n) => n.to_string(),
        TextOrNumber::Null(()) => String::new(),
    })
}
