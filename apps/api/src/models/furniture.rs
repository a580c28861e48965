use serde::{Deserialize, Serialize};

/// A single catalog item as stored in the furniture JSON files.
///
/// Only `id` and `name` are required; every other attribute defaults so that
/// sparse catalog entries still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub wood_type: String,
    #[serde(default)]
    pub finish: String,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub image_path: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub depth: f64,
}

/// On-disk wrapper: `{ "data": record }` or `{ "data": [record, ...] }`.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub data: CatalogData,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CatalogData {
    Many(Vec<FurnitureRecord>),
    One(Box<FurnitureRecord>),
}

impl CatalogData {
    pub fn into_records(self) -> Vec<FurnitureRecord> {
        match self {
            CatalogData::Many(records) => records,
            CatalogData::One(record) => vec![*record],
        }
    }
}
