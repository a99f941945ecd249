//! Row model for the `resources` table.

use catalog_core::resource::Resource;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A row from the `resources` table, audit columns included.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    #[sqlx(rename = "_id")]
    pub surrogate_id: i64,
    pub id: String,
    pub sku: String,
    pub seller: String,
    pub campaign_code: String,
    pub product_name: String,
    pub brand: String,
    pub category: String,
    pub subcategory: String,
    pub size: String,
    pub list_price: f64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResourceRow> for Resource {
    fn from(row: ResourceRow) -> Self {
        Resource {
            surrogate_id: Some(row.surrogate_id.to_string()),
            id: row.id,
            sku: row.sku,
            seller: row.seller,
            campaign_code: row.campaign_code,
            product_name: row.product_name,
            brand: row.brand,
            category: row.category,
            subcategory: row.subcategory,
            size: row.size,
            list_price: row.list_price,
            price: row.price,
        }
    }
}
