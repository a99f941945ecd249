//! Bulk CSV import.
//!
//! Each line of the uploaded document is one candidate resource, columns in
//! a fixed order and no header row. Rows are validated, re-priced and
//! upserted independently and concurrently; a bad row is reported, never
//! fatal to the batch.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::identifier::derive_id;
use crate::resource::{quote, validate, ValidationError};
use crate::store::{ResourceStore, StoreError, COLLECTION};

/// Column order of an import row.
pub const COLUMNS: [&str; 10] = [
    "sku",
    "seller",
    "campaign_code",
    "product_name",
    "brand",
    "category",
    "subcategory",
    "size",
    "list_price",
    "price",
];

/// Markup applied to the discounted list price.
pub const PRICE_MARKUP: f64 = 1.1;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Not a valid csv file: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One parsed line, before validation.
///
/// Short lines keep only the columns they have; extra columns are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    values: Vec<String>,
}

impl CandidateRow {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .take(COLUMNS.len())
                .map(Into::into)
                .collect(),
        }
    }

    /// Pair the row's values with their column names.
    pub fn to_mapping(&self) -> Map<String, Value> {
        COLUMNS
            .iter()
            .zip(&self.values)
            .map(|(column, value)| (column.to_string(), Value::String(value.clone())))
            .collect()
    }
}

impl fmt::Display for CandidateRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = COLUMNS
            .iter()
            .zip(&self.values)
            .map(|(column, value)| format!("{column}={}", quote(value)))
            .collect();
        write!(f, "Resource({})", fields.join(", "))
    }
}

/// Split a CSV document into candidate rows. Blank lines are skipped.
pub fn parse_rows(content: &str) -> Result<Vec<CandidateRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(CandidateRow::new(record.iter()));
    }
    Ok(rows)
}

/// Imported `price` is a discount off `list_price`; the stored price is the
/// discounted list price with the markup, rounded to cents.
pub fn recalculate_price(list_price: f64, discount: f64) -> f64 {
    ((list_price - discount) * PRICE_MARKUP * 100.0).round() / 100.0
}

/// Outcome of an import: failure messages in input order.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub resources_failed: Vec<String>,
}

impl ImportReport {
    pub fn all_succeeded(&self) -> bool {
        self.resources_failed.is_empty()
    }
}

fn failure_message(row: &CandidateRow, reason: &ValidationError) -> String {
    format!("Fail to create or update {row}, reason: {reason}")
}

#[derive(Clone)]
pub struct BulkImporter {
    store: Arc<dyn ResourceStore>,
}

impl BulkImporter {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// Import every row of a CSV document.
    ///
    /// All rows are attempted even when some fail. A storage failure is not
    /// a row failure: it is returned once every row has finished.
    pub async fn import_csv(&self, content: &str) -> Result<ImportReport, ImportError> {
        let rows = parse_rows(content)?;
        tracing::info!(rows = rows.len(), collection = COLLECTION, "Importing resources");

        let outcomes = join_all(rows.iter().map(|row| self.import_row(row))).await;

        let mut report = ImportReport::default();
        for outcome in outcomes {
            if let Some(message) = outcome? {
                report.resources_failed.push(message);
            }
        }

        if !report.all_succeeded() {
            tracing::warn!(
                failed = report.resources_failed.len(),
                rows = rows.len(),
                "Import finished with failed rows"
            );
        }
        Ok(report)
    }

    /// `Ok(Some(message))` for a rejected row, `Ok(None)` once upserted.
    async fn import_row(&self, row: &CandidateRow) -> Result<Option<String>, StoreError> {
        let mut resource = match validate(&row.to_mapping()) {
            Ok(resource) => resource,
            Err(err) => return Ok(Some(failure_message(row, &err))),
        };

        resource.id = derive_id(&resource.sku, &resource.seller, &resource.campaign_code);
        resource.price = recalculate_price(resource.list_price, resource.price);
        if resource.price <= 0.0 {
            let err = ValidationError::NotPositive {
                field: "price",
                label: "Price",
            };
            return Ok(Some(failure_message(row, &err)));
        }

        tracing::info!(id = %resource.id, collection = COLLECTION, "Creating or updating resource");
        self.store.upsert_by_business_key(&resource).await?;
        Ok(None)
    }
}
