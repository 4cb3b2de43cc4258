//! Product records and the payloads that create and update them.
//!
//! [`Product`] is exactly the shape persisted in the catalog file (one
//! element of the top-level JSON array, camelCase keys). [`NewProduct`] and
//! [`ProductUpdate`] are the loosely-typed inputs accepted from the HTTP
//! layer and CLI: prices may arrive as strings, sequences may arrive as
//! anything, and the store decides what to keep.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{CatalogError, CatalogResult};

/// Category assigned when none is given at creation.
pub const DEFAULT_CATEGORY: &str = "general";

/// A single product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Variant objects are stored as-is; only their being a list is checked.
    #[serde(default)]
    pub variants: Vec<Value>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub num_reviews: i64,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_in_stock() -> bool {
    true
}

/// Payload for creating a product. Only `name` is required.
///
/// Unknown keys (including `id`, `createdAt` and `updatedAt`) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Value>,
    pub category: Option<String>,
    pub images: Option<Value>,
    pub variants: Option<Value>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub rating: Option<f64>,
    pub num_reviews: Option<i64>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl NewProduct {
    /// A payload carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Returns the trimmed-non-empty name or a validation error.
    pub fn required_name(&self) -> CatalogResult<&str> {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(CatalogError::validation("name is required")),
        }
    }

    /// The explicit slug, if one was given and is not blank.
    pub fn explicit_slug(&self) -> Option<&str> {
        non_blank(self.slug.as_deref())
    }

    /// Builds the stored record, applying creation defaults.
    ///
    /// `slug` must already be normalized and checked for uniqueness.
    pub fn into_product(self, id: String, slug: String, now: DateTime<Utc>) -> CatalogResult<Product> {
        let name = self.required_name()?.to_string();
        let price = match &self.price {
            Some(value) => coerce_price(value)?,
            None => 0.0,
        };
        let images = match &self.images {
            Some(value) => string_sequence(value, "images")?.unwrap_or_default(),
            None => Vec::new(),
        };
        let variants = self
            .variants
            .as_ref()
            .and_then(value_sequence)
            .unwrap_or_default();

        Ok(Product {
            id,
            name,
            slug,
            description: self.description.unwrap_or_default(),
            price,
            category: self.category.unwrap_or_else(default_category),
            images,
            variants,
            featured: self.featured.unwrap_or(false),
            in_stock: self.in_stock.unwrap_or(true),
            rating: self.rating,
            num_reviews: self.num_reviews.unwrap_or(0),
            stock: self.stock,
            sku: self.sku,
            created_at: now,
            updated_at: now,
            metadata: self.metadata.unwrap_or_default(),
        })
    }
}

/// Partial update payload. Absent keys leave the field untouched.
///
/// For the nullable fields (`rating`, `stock`, `sku`) an explicit JSON
/// `null` clears the value, hence the nested `Option`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Value>,
    pub category: Option<String>,
    pub images: Option<Value>,
    pub variants: Option<Value>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<f64>>,
    pub num_reviews: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub stock: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sku: Option<Option<String>>,
    pub metadata: Option<Map<String, Value>>,
}

impl ProductUpdate {
    /// The text the new slug should be derived from, if the update
    /// touches the slug at all: an explicit slug wins over a new name.
    pub fn slug_source(&self) -> Option<&str> {
        non_blank(self.slug.as_deref()).or(self.name.as_deref())
    }

    /// Rejects updates that would blank out the name.
    pub fn validate(&self) -> CatalogResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CatalogError::validation("name must not be empty"));
            }
        }
        Ok(())
    }
}

impl Product {
    /// Shallow-merges `update` into this record.
    ///
    /// `slug` is the already-resolved slug for the record after the update.
    /// `id` and `created_at` are never touched; `updated_at` becomes `now`.
    /// Nothing is modified if the update is rejected.
    pub fn apply(&mut self, update: ProductUpdate, slug: String, now: DateTime<Utc>) -> CatalogResult<()> {
        update.validate()?;
        let price = update.price.as_ref().map(coerce_price).transpose()?;
        let images = match &update.images {
            Some(value) => string_sequence(value, "images")?,
            None => None,
        };
        let variants = update.variants.as_ref().and_then(value_sequence);

        if let Some(name) = update.name {
            self.name = name;
        }
        self.slug = slug;
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(images) = images {
            self.images = images;
        }
        if let Some(variants) = variants {
            self.variants = variants;
        }
        if let Some(featured) = update.featured {
            self.featured = featured;
        }
        if let Some(in_stock) = update.in_stock {
            self.in_stock = in_stock;
        }
        if let Some(rating) = update.rating {
            self.rating = rating;
        }
        if let Some(num_reviews) = update.num_reviews {
            self.num_reviews = num_reviews;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(sku) = update.sku {
            self.sku = sku;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Product {
    /// Converts one element of a catalog file into a record.
    ///
    /// Files written by other tools are accepted as loosely as the create
    /// path accepts input: `null` on a defaulted field means the default,
    /// numeric fields may be strings or floats, and non-list `images` /
    /// `variants` or a non-object `metadata` fall back to empty. Entries
    /// missing `id`, `name`, `slug` or the timestamps are still rejected.
    pub fn from_stored(value: Value) -> CatalogResult<Product> {
        let Value::Object(mut fields) = value else {
            return Err(CatalogError::validation("catalog entry is not an object"));
        };
        fields.retain(|_, v| !v.is_null());

        for key in ["price", "rating"] {
            if let Some(v) = fields.get(key) {
                let n = coerce_number(v, key)?;
                fields.insert(key.to_string(), Value::from(n));
            }
        }
        for key in ["numReviews", "stock"] {
            if let Some(v) = fields.get(key) {
                let n = coerce_number(v, key)?.round() as i64;
                fields.insert(key.to_string(), Value::from(n));
            }
        }
        for key in ["images", "variants"] {
            if fields.get(key).is_some_and(|v| !v.is_array()) {
                fields.remove(key);
            }
        }
        if fields.get("metadata").is_some_and(|v| !v.is_object()) {
            fields.remove("metadata");
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| CatalogError::validation(format!("malformed catalog entry: {}", e)))
    }
}

/// Current time at the precision the catalog file stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Coerces a loosely-typed JSON price into a number.
///
/// Numbers pass through, numeric strings are parsed (blank means zero),
/// booleans map to 1/0 and `null` to zero. Anything else is rejected.
pub fn coerce_price(value: &Value) -> CatalogResult<f64> {
    coerce_number(value, "price")
}

fn coerce_number(value: &Value, field: &str) -> CatalogResult<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(CatalogError::validation(format!(
            "{} must be numeric, got {}",
            field, value
        ))),
    }
}

/// `Some(list)` if `value` is an array of strings, `None` if it is not an
/// array at all. An array holding non-strings is a validation error.
fn string_sequence(value: &Value, field: &str) -> CatalogResult<Option<Vec<String>>> {
    let Value::Array(items) = value else {
        return Ok(None);
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| CatalogError::validation(format!("{} must contain only strings", field)))
        })
        .collect::<CatalogResult<Vec<_>>>()
        .map(Some)
}

fn value_sequence(value: &Value) -> Option<Vec<Value>> {
    value.as_array().cloned()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// ISO 8601 timestamps with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
