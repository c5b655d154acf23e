// Catalog API payload -> snapshot rows
use crate::model::{ParserError, ProductId, ProductRow, Snapshot};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

pub const NO_BRAND: &str = "nodata";

pub trait Parser {
    fn parse(&self, payload: &Value) -> Result<Snapshot, ParserError>;
}

#[derive(Debug, Deserialize)]
struct CatalogPage {
    #[serde(default)]
    data: Option<CatalogData>,
}

#[derive(Debug, Deserialize)]
struct CatalogData {
    #[serde(default)]
    product: Option<Vec<ApiProduct>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiProduct {
    id: ProductId,
    name: String,
    #[serde(default)]
    brand: Option<ApiBrand>,
    #[serde(default)]
    variants: Vec<ApiVariant>,
    primary_category: ApiCategory,
}

#[derive(Debug, Deserialize)]
struct ApiBrand {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiVariant {
    full_name: String,
    #[serde(default)]
    store_specific_data: Vec<ApiStoreData>,
}

#[derive(Debug, Deserialize)]
struct ApiStoreData {
    #[serde(deserialize_with = "lenient_number")]
    mrp: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    discount: f64,
    #[serde(default, deserialize_with = "lenient_stock")]
    stock: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCategory {
    parent_category: ApiParentCategory,
}

#[derive(Debug, Deserialize)]
struct ApiParentCategory {
    slug: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Numbers sometimes arrive as strings ("12.50"). NaN and infinities are rejected.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(v) => v,
        NumberOrText::Text(s) => s.trim().parse::<f64>().map_err(de::Error::custom)?,
    };
    if !value.is_finite() {
        return Err(de::Error::custom(format!("non-finite number {}", value)));
    }
    Ok(value)
}

/// Stock counts may be floats ("3.0", 3.0); the fraction is dropped.
fn lenient_stock<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer).map(|v| v.trunc() as i64)
}

impl ApiProduct {
    fn into_row(self) -> Result<ProductRow, ParserError> {
        let product = self.id.to_string();
        let variant = self.variants.into_iter().next().ok_or_else(|| ParserError::MissingField {
            product: product.clone(),
            field: "variants[0]",
        })?;
        let store = variant
            .store_specific_data
            .into_iter()
            .next()
            .ok_or(ParserError::MissingField {
                product,
                field: "variants[0].storeSpecificData[0]",
            })?;

        let brand = self
            .brand
            .and_then(|b| b.name)
            .unwrap_or_else(|| NO_BRAND.to_string());

        Ok(ProductRow {
            category: self.primary_category.parent_category.slug,
            name: self.name,
            id: self.id,
            full_name: variant.full_name,
            brand,
            price: store.mrp,
            discount: store.discount,
            stock: store.stock,
        })
    }
}

pub struct CatalogParser;

impl CatalogParser {
    pub fn new() -> Self {
        Self
    }

    /// Concatenates the rows of every page. Pages that do not match the
    /// schema are skipped with a warning.
    pub fn flatten(&self, payloads: &[Value]) -> Snapshot {
        let mut rows = Vec::new();
        let mut skipped = 0;

        for (i, payload) in payloads.iter().enumerate() {
            match self.parse(payload) {
                Ok(page) => rows.extend(page),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping page {}: {}", i, e);
                }
            }
        }

        info!(
            "Flattened {} pages into {} rows ({} skipped)",
            payloads.len(),
            rows.len(),
            skipped
        );
        rows
    }
}

impl Parser for CatalogParser {
    fn parse(&self, payload: &Value) -> Result<Snapshot, ParserError> {
        let page = CatalogPage::deserialize(payload)?;

        let products = match page.data.and_then(|d| d.product) {
            Some(products) => products,
            None => return Ok(Vec::new()),
        };

        products.into_iter().map(ApiProduct::into_row).collect()
    }
}
